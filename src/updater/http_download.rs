use crate::common::{error, info};
use crate::updater::completion::CompletionSignal;
use crate::updater::service::{
    DownloadOutcome, DownloadProgress, DownloadRequest, DownloadService, FailureReason, JobId,
};
use anyhow::{anyhow, Context};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Default)]
struct JobProgress {
    downloaded: AtomicU64,
    total: AtomicU64,
}

/// Downloads each job on a worker thread of its own and writes it straight to the destination.
///
/// Progress of a job can be queried until it completes.
pub struct HttpDownloadService {
    client: Client,
    jobs: Arc<Mutex<HashMap<JobId, Arc<JobProgress>>>>,
    next_id: AtomicI64,
}

impl HttpDownloadService {
    pub fn create(user_agent: &str) -> anyhow::Result<HttpDownloadService> {
        let client =
            Client::builder().user_agent(user_agent).build().context("Could not build client")?;
        Ok(HttpDownloadService {
            client,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicI64::new(1),
        })
    }

    fn run_job(
        client: &Client,
        request: &DownloadRequest,
        progress: &JobProgress,
    ) -> DownloadOutcome {
        match Self::download(client, request, progress) {
            Ok(()) => DownloadOutcome::Successful,
            Err(reason) => {
                if reason != FailureReason::FileAlreadyExists {
                    let _ = fs::remove_file(&request.destination);
                }
                DownloadOutcome::Failed(reason)
            }
        }
    }

    fn download(
        client: &Client,
        request: &DownloadRequest,
        progress: &JobProgress,
    ) -> Result<(), FailureReason> {
        let mut response = client.get(&request.url).send().map_err(|e| {
            error(format!("Could not get {}: {e}", request.url));
            if e.is_redirect() {
                FailureReason::TooManyRedirects
            } else {
                FailureReason::HttpDataError
            }
        })?;

        let status_code = response.status();
        if !status_code.is_success() {
            error(format!("Download of {} failed: {status_code}", request.url));
            return Err(FailureReason::UnhandledHttpCode);
        }

        let total = response.content_length().unwrap_or(0);
        progress.total.store(total, Ordering::Release);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&request.destination)
            .map_err(|e| Self::file_failure(&e))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let count = match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(count) => count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error(format!("Could not read body of {}: {e}", request.url));
                    return Err(FailureReason::HttpDataError);
                }
            };
            file.write_all(&buffer[..count]).map_err(|e| Self::file_failure(&e))?;
            progress.downloaded.fetch_add(count as u64, Ordering::AcqRel);
        }
        file.flush().map_err(|e| Self::file_failure(&e))?;

        let downloaded = progress.downloaded.load(Ordering::Acquire);
        if total > 0 && downloaded != total {
            error(format!("Expected {total} bytes from {}, got {downloaded}", request.url));
            return Err(FailureReason::HttpDataError);
        }
        Ok(())
    }

    fn file_failure(e: &io::Error) -> FailureReason {
        error(format!("Could not write download: {e}"));
        match e.kind() {
            io::ErrorKind::AlreadyExists => FailureReason::FileAlreadyExists,
            io::ErrorKind::StorageFull => FailureReason::InsufficientSpace,
            io::ErrorKind::NotFound => FailureReason::DeviceNotFound,
            _ => FailureReason::FileError,
        }
    }

    fn progress_of(&self, job: JobId) -> Option<Arc<JobProgress>> {
        self.jobs.lock().ok()?.get(&job).cloned()
    }
}

impl DownloadService for HttpDownloadService {
    fn enqueue(
        &self,
        request: DownloadRequest,
        completion: CompletionSignal,
    ) -> anyhow::Result<JobId> {
        let job = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let progress = Arc::new(JobProgress::default());
        self.jobs
            .lock()
            .map_err(|e| anyhow!("Failed to acquire mutex lock: {e}"))?
            .insert(job, Arc::clone(&progress));

        let client = self.client.clone();
        let jobs = Arc::clone(&self.jobs);
        thread::Builder::new()
            .name(format!("download-{}", job.0))
            .spawn(move || {
                info(&format!("{}: {}", request.title, request.description));
                let outcome = Self::run_job(&client, &request, &progress);
                info(&format!("Download job {} finished: {outcome:?}", job.0));
                if let Ok(mut jobs) = jobs.lock() {
                    jobs.remove(&job);
                }
                completion.complete(outcome);
            })
            .with_context(|| format!("Could not spawn download job {}", job.0))?;

        Ok(job)
    }

    fn query(&self, job: JobId) -> Option<DownloadProgress> {
        self.progress_of(job).map(|progress| DownloadProgress {
            downloaded: progress.downloaded.load(Ordering::Acquire),
            total: progress.total.load(Ordering::Acquire),
        })
    }
}
