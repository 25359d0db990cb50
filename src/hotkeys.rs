//! Global start/stop hotkeys driving the session controller.
//!
//! Carbon hotkey events are delivered through the main thread's run loop, so
//! this pumps the CFRunLoop on the calling (main) thread and polls the
//! hotkey channel between slices.

use std::time::Duration;

use anyhow::{Context, Result};
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::config::RecorderConfig;
use crate::recorder::{SessionController, SessionSummary};

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

pub struct Hotkeys {
    _manager: GlobalHotKeyManager,
    start: HotKey,
    stop: HotKey,
}

impl Hotkeys {
    pub fn register(config: &RecorderConfig) -> Result<Self> {
        let start: HotKey = config
            .start_hotkey
            .parse()
            .with_context(|| format!("invalid start hotkey '{}'", config.start_hotkey))?;
        let stop: HotKey = config
            .stop_hotkey
            .parse()
            .with_context(|| format!("invalid stop hotkey '{}'", config.stop_hotkey))?;

        let manager = GlobalHotKeyManager::new().context("failed to create hotkey manager")?;
        manager
            .register(start)
            .with_context(|| format!("failed to register '{}'", config.start_hotkey))?;
        manager
            .register(stop)
            .with_context(|| format!("failed to register '{}'", config.stop_hotkey))?;

        Ok(Self {
            _manager: manager,
            start,
            stop,
        })
    }

    /// Serve hotkeys until a session is stopped and saved.
    pub fn run(&self, controller: &mut SessionController) -> Result<SessionSummary> {
        let events = GlobalHotKeyEvent::receiver();
        loop {
            let _ = unsafe { CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, PUMP_INTERVAL, true) };

            while let Ok(event) = events.try_recv() {
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                if event.id == self.start.id() {
                    if let Err(err) = controller.start() {
                        log::error!("failed to start recording: {err}");
                    }
                } else if event.id == self.stop.id() {
                    if let Some(summary) = controller.stop()? {
                        return Ok(summary);
                    }
                }
            }
        }
    }
}
