//! One-shot rendezvous between a download service and the poll loop waiting on it.

use crate::common::error;
use crate::updater::service::{DownloadOutcome, FailureReason};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

pub fn completion_channel() -> (CompletionSignal, CompletionWaiter) {
    let (sender, receiver) = sync_channel(1);
    (CompletionSignal { sender }, CompletionWaiter { receiver })
}

/// Producer side, handed to the download service together with the job.
#[derive(Debug)]
pub struct CompletionSignal {
    sender: SyncSender<DownloadOutcome>,
}

impl CompletionSignal {
    pub fn complete(self, outcome: DownloadOutcome) {
        // the waiter is gone once the workflow has ended, nobody is left to tell
        let _ = self.sender.send(outcome);
    }
}

#[derive(Debug)]
pub struct CompletionWaiter {
    receiver: Receiver<DownloadOutcome>,
}

impl CompletionWaiter {
    /// Non-blocking check, `None` while the job is still running.
    pub fn try_receive(&self) -> Option<DownloadOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Self::abandoned()),
        }
    }

    /// Block for at most `timeout`, returning early as soon as the outcome arrives.
    pub fn wait(&self, timeout: Duration) -> Option<DownloadOutcome> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Self::abandoned()),
        }
    }

    fn abandoned() -> DownloadOutcome {
        error("Download service dropped the completion signal without reporting an outcome");
        DownloadOutcome::Failed(FailureReason::Unknown)
    }
}
