//! Foreground window title lookup with bounded retry.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Returned when no title could be read within the retry budget.
pub const UNKNOWN_TITLE: &str = "Unknown";

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("no frontmost application")]
    NoFrontmostApp,
    #[error("no windows found")]
    NoWindows,
}

/// Reads the title of the OS foreground window.
///
/// Implementations may return an empty string or an error while focus is
/// changing; callers retry.
pub trait ForegroundWindow: Send + Sync {
    fn foreground_title(&self) -> Result<String, WindowError>;
}

#[derive(Clone)]
pub struct TitleOracle {
    source: Arc<dyn ForegroundWindow>,
    attempts: u32,
    pause: Duration,
}

impl TitleOracle {
    pub fn new(source: Arc<dyn ForegroundWindow>, attempts: u32, pause: Duration) -> Self {
        Self {
            source,
            attempts: attempts.max(1),
            pause,
        }
    }

    /// The current foreground title, or [`UNKNOWN_TITLE`].
    pub fn resolve(&self) -> String {
        for attempt in 1..=self.attempts {
            match self.source.foreground_title() {
                Ok(title) if !title.is_empty() => return title,
                Ok(_) => log::debug!("foreground title empty (attempt {attempt})"),
                Err(err) => log::debug!("foreground title lookup failed (attempt {attempt}): {err}"),
            }
            thread::sleep(self.pause);
        }
        UNKNOWN_TITLE.to_string()
    }
}

pub fn is_resolved(title: &str) -> bool {
    !title.is_empty() && title != UNKNOWN_TITLE
}
