#![cfg(target_os = "android")]

use crate::common::android_util::{AndroidUtil, STATUS_FAILED, STATUS_SUCCESSFUL};
use crate::common::{error, info};
use crate::updater::completion::CompletionSignal;
use crate::updater::service::{
    DownloadOutcome, DownloadProgress, DownloadRequest, DownloadService, FailureReason, Installer,
    JobId,
};
use anyhow::{anyhow, Context};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Hands jobs to the platform `DownloadManager` and watches them until they end.
pub struct AndroidDownloadService {
    poll_interval: Duration,
}

impl AndroidDownloadService {
    pub fn create(poll_interval: Duration) -> AndroidDownloadService {
        AndroidDownloadService { poll_interval }
    }

    fn watch(id: i64, poll_interval: Duration) -> DownloadOutcome {
        loop {
            match AndroidUtil::create().and_then(|util| util.query_download(id)) {
                Ok(Some(status)) if status.status == STATUS_SUCCESSFUL => {
                    return DownloadOutcome::Successful
                }
                Ok(Some(status)) if status.status == STATUS_FAILED => {
                    return DownloadOutcome::Failed(FailureReason::from_download_manager(
                        status.reason,
                    ))
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    error(format!("Download {id} vanished from DownloadManager"));
                    return DownloadOutcome::Failed(FailureReason::Unknown);
                }
                Err(e) => {
                    error(format!("Could not query download {id}: {e:#}"));
                    return DownloadOutcome::Failed(FailureReason::Unknown);
                }
            }
            thread::sleep(poll_interval);
        }
    }
}

impl DownloadService for AndroidDownloadService {
    fn enqueue(
        &self,
        request: DownloadRequest,
        completion: CompletionSignal,
    ) -> anyhow::Result<JobId> {
        let destination = request
            .destination
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert {:?} to string", request.destination))?;
        let id = AndroidUtil::create()?.enqueue_download(
            &request.url,
            destination,
            &request.title,
            &request.description,
        )?;
        info(&format!("Enqueued download {id} for {}", request.url));

        let poll_interval = self.poll_interval;
        thread::Builder::new()
            .name(format!("download-watch-{id}"))
            .spawn(move || completion.complete(Self::watch(id, poll_interval)))
            .with_context(|| format!("Could not watch download {id}"))?;

        Ok(JobId(id))
    }

    fn query(&self, job: JobId) -> Option<DownloadProgress> {
        match AndroidUtil::create().and_then(|util| util.query_download(job.0)) {
            Ok(status) => status.map(|s| DownloadProgress {
                downloaded: s.downloaded.max(0) as u64,
                total: s.total.max(0) as u64,
            }),
            Err(e) => {
                error(format!("Could not query download {}: {e:#}", job.0));
                None
            }
        }
    }
}

/// Opens the package installer for the downloaded APK.
pub struct AndroidInstaller;

impl Installer for AndroidInstaller {
    fn install(&self, apk: &Path) -> anyhow::Result<()> {
        let apk = apk.to_str().ok_or_else(|| anyhow!("Could not convert {apk:?} to string"))?;
        AndroidUtil::create()?.start_install_activity(apk)
    }
}
