//! Contracts of the external collaborators that perform the actual download and installation.

use crate::updater::completion::CompletionSignal;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    pub title: String,
    pub description: String,
}

/// Byte progress of a running job, `total` is 0 while the size is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
}

impl DownloadProgress {
    /// Share of the download scaled to the 80 points it occupies in the overall progress.
    pub fn scaled_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.downloaded as f64 / self.total as f64 * 100.0 * 0.8).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    CannotResume,
    DeviceNotFound,
    FileAlreadyExists,
    FileError,
    HttpDataError,
    InsufficientSpace,
    TooManyRedirects,
    UnhandledHttpCode,
    Unknown,
}

impl FailureReason {
    /// Map an `android.app.DownloadManager` `ERROR_*` reason code.
    pub fn from_download_manager(code: i32) -> FailureReason {
        match code {
            1001 => FailureReason::FileError,
            1002 => FailureReason::UnhandledHttpCode,
            1004 => FailureReason::HttpDataError,
            1005 => FailureReason::TooManyRedirects,
            1006 => FailureReason::InsufficientSpace,
            1007 => FailureReason::DeviceNotFound,
            1008 => FailureReason::CannotResume,
            1009 => FailureReason::FileAlreadyExists,
            _ => FailureReason::Unknown,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Successful,
    Failed(FailureReason),
}

pub trait DownloadService: Send + Sync {
    /// Submit a job. The service must call `completion` exactly once when the job ends.
    fn enqueue(&self, request: DownloadRequest, completion: CompletionSignal)
        -> anyhow::Result<JobId>;

    /// Current byte progress of `job`, `None` if the service does not know it (yet).
    fn query(&self, job: JobId) -> Option<DownloadProgress>;
}

pub trait Installer: Send + Sync {
    /// Start installing the APK at `apk`. Returning means the installation was handed off,
    /// not that it finished.
    fn install(&self, apk: &Path) -> anyhow::Result<()>;
}
