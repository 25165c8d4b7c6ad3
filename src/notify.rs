//! User-facing notifications raised by the engine.
//!
//! Failures inside the engine never reach the host as errors. They become a
//! [`Toast`] handed to the host's [`Notifier`].

use parking_lot::Mutex;

/// A failure message for the user. The engine raises one for every failed
/// page fetch or search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// The message to display
    pub message: String,
}

impl Toast {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives toasts from an engine.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Sends toasts to the log. Used when the host provides no notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        tracing::error!("{}", toast.message);
    }
}

/// Keeps every toast it receives.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
