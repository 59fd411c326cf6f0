#![allow(dead_code)]

use kodi_updater::updater::completion::CompletionSignal;
use kodi_updater::updater::service::{
    DownloadOutcome, DownloadProgress, DownloadRequest, DownloadService, Installer, JobId,
};
use kodi_updater::updater::{ListingSource, UpdateError, UpdateListener};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn listing_html(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|name| {
            format!("<tr><td class=\"link\"><a href=\"{name}\">{name}</a></td><td>-</td></tr>")
        })
        .collect();
    format!(
        "<html><body><table id=\"list\"><thead><tr><th>File Name</th><th>Size</th></tr></thead>\
         <tbody><tr><td><a href=\"../\">Parent directory/</a></td><td>-</td></tr>\
         <tr><td><a href=\"old/\">old/</a></td><td>-</td></tr>{rows}</tbody></table></body></html>"
    )
}

/// Serve `routes` (path, status, body) over plain HTTP, returns the base url ending in `/`.
pub fn serve(routes: Vec<(&'static str, u16, Vec<u8>)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
            let (status, body) = routes
                .iter()
                .find(|(route, _, _)| *route == path)
                .map(|(_, status, body)| (*status, body.clone()))
                .unwrap_or((404, b"not found".to_vec()));

            let head = format!(
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
    });

    format!("http://{address}/")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CheckFinished(String),
    Progress(bool, u8, String),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
    changed: Condvar,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Block until an event matching `predicate` was recorded.
    pub fn wait_for<F: Fn(&Event) -> bool>(&self, predicate: F) -> Event {
        self.wait_until(|events| events.iter().find(|e| predicate(e)).cloned())
    }

    /// Block until at least `count` events match `predicate`.
    pub fn wait_for_count<F: Fn(&Event) -> bool>(&self, count: usize, predicate: F) -> Vec<Event> {
        self.wait_until(|events| {
            let matching: Vec<Event> = events.iter().filter(|e| predicate(e)).cloned().collect();
            (matching.len() >= count).then_some(matching)
        })
    }

    fn wait_until<T, F: Fn(&[Event]) -> Option<T>>(&self, check: F) -> T {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        let mut events = self.events.lock().unwrap();
        loop {
            if let Some(result) = check(&events) {
                return result;
            }
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| panic!("no matching events, got {events:?}"));
            events = self.changed.wait_timeout(events, remaining).unwrap().0;
        }
    }

    pub fn wait_for_check(&self) -> String {
        match self.wait_for(|e| matches!(e, Event::CheckFinished(_))) {
            Event::CheckFinished(message) => message,
            other => panic!("unexpected event {other:?}"),
        }
    }

    pub fn wait_for_terminal(&self) -> Event {
        self.wait_for(|e| matches!(e, Event::Progress(true, _, _) | Event::Progress(_, 100, _)))
    }

    pub fn progress_percents(&self) -> Vec<u8> {
        let mut percents: Vec<u8> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(false, percent, _) => Some(percent),
                _ => None,
            })
            .collect();
        percents.sort();
        percents
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_all();
    }
}

impl UpdateListener for RecordingListener {
    fn on_check_for_update_finished(&self, message: &str) {
        self.record(Event::CheckFinished(message.to_string()));
    }

    fn on_update_progress(&self, is_error: bool, percent: u8, message: &str) {
        self.record(Event::Progress(is_error, percent, message.to_string()));
    }
}

/// Listing source returning a fixed result and counting how often it was asked.
pub struct StaticListing {
    result: Result<String, UpdateError>,
    pub calls: Arc<AtomicUsize>,
}

impl StaticListing {
    pub fn with_artifact(name: &str) -> StaticListing {
        StaticListing { result: Ok(listing_html(&[name])), calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn failing(err: UpdateError) -> StaticListing {
        StaticListing { result: Err(err), calls: Arc::new(AtomicUsize::new(0)) }
    }
}

impl ListingSource for StaticListing {
    fn fetch(&self, _url: &str) -> Result<String, UpdateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Download service that replays `progress` on each query and fires `outcome` on query number
/// `complete_after` (or right away when it is 0).
pub struct FakeDownloadService {
    progress: Vec<DownloadProgress>,
    outcome: DownloadOutcome,
    complete_after: usize,
    drop_signal: bool,
    fail_enqueue: bool,
    queries: AtomicUsize,
    signal: Mutex<Option<CompletionSignal>>,
    pub requests: Mutex<Vec<DownloadRequest>>,
}

impl FakeDownloadService {
    pub fn create(
        progress: &[(u64, u64)],
        outcome: DownloadOutcome,
        complete_after: usize,
    ) -> Self {
        FakeDownloadService {
            progress: progress
                .iter()
                .map(|&(downloaded, total)| DownloadProgress { downloaded, total })
                .collect(),
            outcome,
            complete_after,
            drop_signal: false,
            fail_enqueue: false,
            queries: AtomicUsize::new(0),
            signal: Mutex::new(None),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn successful() -> Self {
        Self::create(&[(100, 100)], DownloadOutcome::Successful, 1)
    }

    pub fn dropping_signal() -> Self {
        FakeDownloadService { drop_signal: true, ..Self::successful() }
    }

    pub fn failing_enqueue() -> Self {
        FakeDownloadService { fail_enqueue: true, ..Self::successful() }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn complete(&self) {
        if let Some(signal) = self.signal.lock().unwrap().take() {
            signal.complete(self.outcome);
        }
    }
}

impl DownloadService for FakeDownloadService {
    fn enqueue(
        &self,
        request: DownloadRequest,
        completion: CompletionSignal,
    ) -> anyhow::Result<JobId> {
        if self.fail_enqueue {
            anyhow::bail!("download service unavailable");
        }
        if self.outcome == DownloadOutcome::Successful {
            std::fs::write(&request.destination, b"apk")?;
        }
        self.requests.lock().unwrap().push(request);

        if self.drop_signal {
            drop(completion);
        } else {
            *self.signal.lock().unwrap() = Some(completion);
            if self.complete_after == 0 {
                self.complete();
            }
        }
        Ok(JobId(7))
    }

    fn query(&self, job: JobId) -> Option<DownloadProgress> {
        assert_eq!(job, JobId(7));
        let count = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        let progress = self.progress[(count - 1).min(self.progress.len() - 1)];
        if count >= self.complete_after {
            self.complete();
        }
        Some(progress)
    }
}

#[derive(Default)]
pub struct FakeInstaller {
    pub fail: bool,
    pub installed: Mutex<Vec<PathBuf>>,
}

impl Installer for FakeInstaller {
    fn install(&self, apk: &Path) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("no package installer found");
        }
        assert!(apk.exists(), "{apk:?} was not downloaded");
        self.installed.lock().unwrap().push(apk.to_path_buf());
        Ok(())
    }
}
