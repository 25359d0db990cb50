use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// Cooperative stop signal shared by the session's worker threads.
///
/// Nothing is ever sent on the channel: cancelling drops the only sender, so
/// every receiver observes a disconnect at once, including ones blocked in
/// `select!` or a timed wait.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Sleep for `duration` or until cancelled. Returns true if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.receiver.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Becomes ready (with an error) once cancelled; for use in `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
