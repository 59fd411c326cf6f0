//! Checks the Kodi mirror for a newer APK, downloads it and hands it to the installer.

#[cfg(target_os = "android")]
pub mod android;
pub mod busy_gate;
pub mod completion;
pub mod error;
pub mod http_download;
pub mod installer;
pub mod locator;
pub mod notify;
pub mod service;
pub mod version;

use crate::common::fs::prepare_download_dir;
use crate::common::{error, info};
use crate::config::config_updater::ConfigUpdater;
use crate::updater::completion::{completion_channel, CompletionWaiter};
use crate::updater::error::check_finished_message;
use crate::updater::locator::HttpListing;
use crate::updater::notify::ProgressReporter;
use crate::updater::service::{DownloadOutcome, DownloadRequest};
use crate::updater::version::is_newer;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub use busy_gate::BusyGate;
pub use error::UpdateError;
pub use locator::{ArtifactDescriptor, ArtifactLocator, ListingSource};
pub use notify::{Notifier, UpdateListener};
pub use service::{DownloadService, FailureReason, Installer, JobId};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterSettings {
    pub download_dir: PathBuf,
    pub apk_prefix: String,
    pub poll_interval: Duration,
}

impl From<&ConfigUpdater> for UpdaterSettings {
    fn from(config: &ConfigUpdater) -> Self {
        UpdaterSettings {
            download_dir: config.download_dir.clone(),
            apk_prefix: config.apk_prefix.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Runs the update workflows, each call on a thread of its own. Results are only reported to the
/// `UpdateListener`.
///
/// Clones share the busy gate and the last check result.
#[derive(Clone)]
pub struct Updater {
    settings: UpdaterSettings,
    gate: Arc<BusyGate>,
    locator: Arc<ArtifactLocator>,
    service: Arc<dyn DownloadService>,
    installer: Arc<dyn Installer>,
    notifier: Notifier,
    latest: Arc<Mutex<Option<ArtifactDescriptor>>>,
}

impl Updater {
    pub fn create(
        settings: UpdaterSettings,
        gate: Arc<BusyGate>,
        locator: ArtifactLocator,
        service: Arc<dyn DownloadService>,
        installer: Arc<dyn Installer>,
    ) -> Updater {
        Updater {
            settings,
            gate,
            locator: Arc::new(locator),
            service,
            installer,
            notifier: Notifier::default(),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Wire up the HTTP listing with the download service and installer of the current platform.
    pub fn from_config(config: &ConfigUpdater, gate: Arc<BusyGate>) -> anyhow::Result<Updater> {
        let locator = ArtifactLocator::create(
            &config.listing_url,
            config.listing_row,
            Box::new(HttpListing::create(&config.user_agent)?),
        );

        #[cfg(not(target_os = "android"))]
        let (service, installer): (Arc<dyn DownloadService>, Arc<dyn Installer>) = (
            Arc::new(http_download::HttpDownloadService::create(&config.user_agent)?),
            Arc::new(installer::CommandInstaller::create(config.install_command.clone())?),
        );

        #[cfg(target_os = "android")]
        let (service, installer): (Arc<dyn DownloadService>, Arc<dyn Installer>) = (
            Arc::new(android::AndroidDownloadService::create(config.poll_interval())),
            Arc::new(android::AndroidInstaller),
        );

        Ok(Updater::create(UpdaterSettings::from(config), gate, locator, service, installer))
    }

    pub fn with_listener(mut self, listener: Arc<dyn UpdateListener>) -> Updater {
        self.notifier = Notifier::new(listener);
        self
    }

    /// Artifact found by the last successful check.
    pub fn latest_artifact(&self) -> Option<ArtifactDescriptor> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn latest_version(&self) -> Option<String> {
        self.latest_artifact().and_then(|artifact| artifact.version)
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Look up the latest artifact. The outcome is reported through
    /// `UpdateListener::on_check_for_update_finished`.
    ///
    /// * `synchronous` - block until the check has finished
    pub fn check_for_update(&self, synchronous: bool) {
        let updater = self.clone();
        let handle = thread::spawn(move || updater.run_check_workflow());
        if synchronous && handle.join().is_err() {
            error("Update check thread panicked");
        }
    }

    /// Check for a version differing from `previous_version`, download and install it. Progress
    /// and the outcome are reported through `UpdateListener::on_update_progress`.
    pub fn download_and_install(&self, previous_version: &str) -> JoinHandle<()> {
        let updater = self.clone();
        let previous_version = previous_version.to_string();
        thread::spawn(move || updater.run_download_workflow(&previous_version))
    }

    fn run_check_workflow(&self) {
        let Some(_guard) = self.gate.try_lock() else {
            error("Update check requested while the updater is busy");
            let busy: Result<(), UpdateError> = Err(UpdateError::AlreadyBusy);
            self.notifier.check_finished(check_finished_message(&busy));
            return;
        };
        let _ = self.check();
    }

    fn run_download_workflow(&self, previous_version: &str) {
        let mut progress = ProgressReporter::new(self.notifier.clone());
        let result = match self.gate.try_lock() {
            Some(_guard) => self.download_and_install_locked(previous_version, &mut progress),
            None => Err(UpdateError::AlreadyBusy),
        };

        if let Err(e) = result {
            error(format!("Update failed: {e}"));
            progress.fail(&e);
        }
    }

    /// Locate the latest artifact and report the outcome. The caller must hold the busy gate.
    fn check(&self) -> Result<ArtifactDescriptor, UpdateError> {
        let result = self.locator.locate();
        match &result {
            Ok(artifact) => {
                info(&format!(
                    "Update check finished, found {} ({})",
                    artifact.name,
                    artifact.version.as_deref().unwrap_or("no version")
                ));
                *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(artifact.clone());
            }
            Err(e) => error(format!("Update check failed: {e}")),
        }
        self.notifier.check_finished(check_finished_message(&result));
        result
    }

    fn download_and_install_locked(
        &self,
        previous_version: &str,
        progress: &mut ProgressReporter,
    ) -> Result<(), UpdateError> {
        let artifact = self.check().map_err(|_| UpdateError::NoUpdateAvailable)?;
        let (version, url) = update_target(previous_version, artifact)?;
        progress.report(10, "Newer version found, start download..");

        let download_dir = &self.settings.download_dir;
        prepare_download_dir(download_dir).map_err(|e| UpdateError::Filesystem(format!("{e:#}")))?;
        let destination = download_dir.join(format!("{}{version}.apk", self.settings.apk_prefix));

        let (signal, waiter) = completion_channel();
        let request = DownloadRequest {
            url,
            destination: destination.clone(),
            title: "FireStarter Update".to_string(),
            description: format!("Downloading Kodi {version}"),
        };
        info(&format!("Download {} to {destination:?}", request.url));
        let job = self
            .service
            .enqueue(request, signal)
            .map_err(|e| UpdateError::DownloadSubmit(format!("{e:#}")))?;

        match self.await_completion(job, &waiter, progress) {
            DownloadOutcome::Successful => info("Download finished"),
            DownloadOutcome::Failed(reason) => return Err(UpdateError::Download { reason }),
        }

        progress.report(80, "Download finished, start installation..");
        self.installer
            .install(&destination)
            .map_err(|e| UpdateError::InstallTrigger(format!("{e:#}")))?;
        progress.report(100, "Successfully initiated update..");
        info(&format!("Successfully initiated update from {previous_version} to {version}"));
        Ok(())
    }

    /// Report byte progress until the download service signals the end of `job`.
    fn await_completion(
        &self,
        job: JobId,
        waiter: &CompletionWaiter,
        progress: &mut ProgressReporter,
    ) -> DownloadOutcome {
        loop {
            if let Some(outcome) = waiter.try_receive() {
                return outcome;
            }

            if let Some(job_progress) = self.service.query(job) {
                progress.report_download(job_progress.scaled_percent());
            }

            if let Some(outcome) = waiter.wait(self.settings.poll_interval) {
                return outcome;
            }
        }
    }
}

/// Version and download url of `artifact`, if it differs from `previous_version`.
fn update_target(
    previous_version: &str,
    artifact: ArtifactDescriptor,
) -> Result<(String, String), UpdateError> {
    let version = match artifact.version {
        Some(version) if is_newer(previous_version, &version) => version,
        _ => return Err(UpdateError::NoUpdateAvailable),
    };
    let url = artifact.url.ok_or(UpdateError::MissingArtifactUrl)?;
    Ok((version, url))
}

#[cfg(test)]
mod tests {
    use super::{update_target, ArtifactDescriptor, UpdateError};

    fn artifact(version: Option<&str>, url: Option<&str>) -> ArtifactDescriptor {
        ArtifactDescriptor {
            name: "kodi-21.0-Omega-armeabi-v7a.apk".to_string(),
            url: url.map(str::to_string),
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn test_update_target() {
        let url = "http://mirrors.kodi.tv/releases/android/arm/kodi-21.0-Omega-armeabi-v7a.apk";
        assert_eq!(
            update_target("v20.0", artifact(Some("v21.0"), Some(url))),
            Ok(("v21.0".to_string(), url.to_string()))
        );
    }

    #[test]
    fn test_update_target_without_url() {
        assert_eq!(
            update_target("v20.0", artifact(Some("v21.0"), None)),
            Err(UpdateError::MissingArtifactUrl)
        );
    }

    #[test]
    fn test_update_target_same_or_missing_version() {
        assert_eq!(
            update_target("v21.0", artifact(Some("v21.0"), Some("http://x/a.apk"))),
            Err(UpdateError::NoUpdateAvailable)
        );
        assert_eq!(
            update_target("v21.0", artifact(None, None)),
            Err(UpdateError::NoUpdateAvailable)
        );
    }
}
