use crate::updater::service::FailureReason;

/// Failures of the check and download workflows. Observers only ever see the `Display` text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("Updater is already working..")]
    AlreadyBusy,

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Parse(String),

    #[error("No newer version found..")]
    NoUpdateAvailable,

    #[error("Download URL of new version not found..")]
    MissingArtifactUrl,

    #[error("{0}")]
    Filesystem(String),

    #[error("Could not start download: {0}")]
    DownloadSubmit(String),

    #[error("Download failed.. Reason: {reason}")]
    Download { reason: FailureReason },

    #[error("Could not start installation: {0}")]
    InstallTrigger(String),
}

/// Message reported when an update check ends.
///
/// Observers match on the `Update-Check-Error` prefixes, so these strings must stay stable.
pub(crate) fn check_finished_message<T>(result: &Result<T, UpdateError>) -> String {
    match result {
        Ok(_) => "Update finished.".to_string(),
        Err(UpdateError::Network(e)) => format!("Update-Check-Error with connection: {e}"),
        Err(e) => format!("Update-Check-Error with parsing: {e}"),
    }
}
