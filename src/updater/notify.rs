use crate::updater::error::UpdateError;
use std::sync::Arc;
use std::thread;

/// Observer of the update workflows. Every call arrives on a thread of its own, so calls may
/// overlap and are not ordered relative to each other.
pub trait UpdateListener: Send + Sync {
    fn on_check_for_update_finished(&self, _message: &str) {}

    fn on_update_progress(&self, _is_error: bool, _percent: u8, _message: &str) {}
}

#[derive(Clone, Default)]
pub struct Notifier {
    listener: Option<Arc<dyn UpdateListener>>,
}

impl Notifier {
    pub fn new(listener: Arc<dyn UpdateListener>) -> Notifier {
        Notifier { listener: Some(listener) }
    }

    pub(crate) fn check_finished(&self, message: String) {
        if let Some(listener) = self.listener.clone() {
            thread::spawn(move || listener.on_check_for_update_finished(&message));
        }
    }

    pub(crate) fn progress(&self, is_error: bool, percent: u8, message: String) {
        if let Some(listener) = self.listener.clone() {
            thread::spawn(move || listener.on_update_progress(is_error, percent, &message));
        }
    }
}

/// Progress of a single download workflow run. Never reports a percentage below one it has
/// already reported.
pub(crate) struct ProgressReporter {
    notifier: Notifier,
    last: u8,
}

impl ProgressReporter {
    pub(crate) fn new(notifier: Notifier) -> ProgressReporter {
        ProgressReporter { notifier, last: 0 }
    }

    pub(crate) fn report(&mut self, percent: u8, message: &str) -> u8 {
        self.last = percent.min(100).max(self.last);
        self.notifier.progress(false, self.last, message.to_string());
        self.last
    }

    /// Report the download share (0-80) mapped onto 10-90, only if it moved forward.
    pub(crate) fn report_download(&mut self, scaled_percent: u8) -> Option<u8> {
        let percent = 10 + scaled_percent.min(80);
        if percent <= self.last {
            return None;
        }
        Some(self.report(percent, "Download in progress.."))
    }

    pub(crate) fn fail(&mut self, err: &UpdateError) {
        self.last = 100;
        self.notifier.progress(true, 100, err.to_string());
    }
}
