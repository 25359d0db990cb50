pub mod capture;
pub mod classifier;
pub mod click_event;
pub mod controller;
pub mod geometry;
pub mod pointer_monitor;
pub mod screenshot_cache;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod storage;
pub mod title_history;
pub mod types;
pub mod window_monitor;
pub mod window_title;

#[cfg(target_os = "macos")]
pub mod cg_capture;
#[cfg(target_os = "macos")]
pub mod click_listener;
#[cfg(target_os = "macos")]
pub mod window_info;

pub use controller::{Collaborators, RecorderError, SessionController, SessionSummary};

/// Event tap, CGWindowList title lookup and CoreGraphics screen capture.
#[cfg(target_os = "macos")]
pub fn macos_collaborators() -> Collaborators {
    use std::sync::Arc;

    Collaborators {
        pointer: Box::new(click_listener::EventTapSource::new()),
        window: Arc::new(window_info::FrontmostWindow),
        capture: Arc::new(cg_capture::MainDisplayCapture),
    }
}
