//! Turns button transitions into window-attributed actions.
//!
//! Events are handled strictly one at a time in arrival order. After each
//! release the monitor waits for the foreground window to settle, resolves
//! its title, appends the action and takes the title's screenshot before it
//! looks at the next event, so the log is in release order and each title
//! is read after its own click.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, Receiver};

use super::classifier::{classify, DragThresholds, PressRecord};
use super::click_event::ButtonTransition;
use super::geometry::distance;
use super::session::Session;
use super::shutdown::ShutdownSignal;
use super::types::Action;
use super::window_title::{is_resolved, TitleOracle};

/// Recorded when neither the OS nor any earlier observation yields a title.
pub const UNRESOLVED_TITLE: &str = "Unresolved";

#[derive(Debug, Clone, Copy)]
pub struct PointerSettings {
    pub thresholds: DragThresholds,
    pub settle_delay: Duration,
    pub resolve_attempts: u32,
    pub resolve_retry: Duration,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            thresholds: DragThresholds::default(),
            settle_delay: Duration::from_millis(100),
            resolve_attempts: 40,
            resolve_retry: Duration::from_millis(50),
        }
    }
}

enum Resolution {
    Live(String),
    Fallback(String),
}

pub struct PointerMonitor {
    session: Arc<Session>,
    oracle: TitleOracle,
    settings: PointerSettings,
    pending: Option<PressRecord>,
}

impl PointerMonitor {
    pub fn new(session: Arc<Session>, oracle: TitleOracle, settings: PointerSettings) -> Self {
        Self {
            session,
            oracle,
            settings,
            pending: None,
        }
    }

    /// Process one transition; returns the action it completed, if any.
    pub fn handle(&mut self, event: ButtonTransition) -> Option<Action> {
        if !self.session.accepts(event.at) {
            log::debug!("dropping {:?} event outside the session", event.button);
            return None;
        }

        let at = self.session.elapsed(event.at);
        if event.pressed {
            self.pending = Some(PressRecord {
                button: event.button,
                at,
                position: event.position,
            });
            return None;
        }

        let Some(press) = self.pending.take() else {
            log::debug!("dropping {:?} release with no recorded press", event.button);
            return None;
        };

        let candidate = classify(&press, at, event.position, &self.settings.thresholds);
        if candidate.kind.is_drag() {
            log::debug!("drag over {:.1}pt", distance(press.position, event.position));
        }
        let (title, live) = match self.resolve_title() {
            Resolution::Live(title) => (title, true),
            Resolution::Fallback(title) => (title, false),
        };

        let action = self.session.record_action(candidate, title);
        log::info!(
            "recorded {} #{} in '{}'",
            action.kind.as_str(),
            action.sequence_index,
            action.window_title
        );

        if live {
            self.session.ensure_screenshot(&action.window_title);
        }
        Some(action)
    }

    fn resolve_title(&self) -> Resolution {
        thread::sleep(self.settings.settle_delay);

        let attempts = self.settings.resolve_attempts.max(1);
        for attempt in 1..=attempts {
            let title = self.oracle.resolve();
            if is_resolved(&title) {
                return Resolution::Live(title);
            }
            if attempt < attempts {
                thread::sleep(self.settings.resolve_retry);
            }
        }

        let fallback = self
            .session
            .last_known_title()
            .unwrap_or_else(|| UNRESOLVED_TITLE.to_string());
        log::warn!("window title unresolved after {attempts} attempts; using '{fallback}'");
        Resolution::Fallback(fallback)
    }

    /// Handle events until the source closes or `shutdown` fires, then drain
    /// whatever was delivered before the session stopped.
    pub fn run(mut self, events: Receiver<ButtonTransition>, shutdown: ShutdownSignal) {
        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => {
                        self.handle(event);
                    }
                    Err(_) => break,
                },
                recv(shutdown.receiver()) -> _ => break,
            }
        }

        for event in events.try_iter() {
            self.handle(event);
        }
        log::debug!("pointer monitor exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::capture::{CaptureError, ScreenCapture};
    use crate::recorder::click_event::MouseButton;
    use crate::recorder::geometry::Point;
    use crate::recorder::screenshot_cache::ScreenshotCache;
    use crate::recorder::types::{ActionKind, Gesture};
    use crate::recorder::window_title::{ForegroundWindow, WindowError, UNKNOWN_TITLE};
    use chrono::Local;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    struct FixedTitle(Mutex<String>);

    impl ForegroundWindow for FixedTitle {
        fn foreground_title(&self) -> Result<String, WindowError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct CountingCapture(AtomicUsize);

    impl ScreenCapture for CountingCapture {
        fn capture_screen(&self, _output: &Path) -> Result<(), CaptureError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn settings() -> PointerSettings {
        PointerSettings {
            settle_delay: Duration::ZERO,
            resolve_attempts: 3,
            resolve_retry: Duration::ZERO,
            ..PointerSettings::default()
        }
    }

    fn monitor(title: &str) -> (PointerMonitor, Arc<Session>, Arc<CountingCapture>, Instant) {
        let capture = Arc::new(CountingCapture::default());
        let cache = ScreenshotCache::new("shots".into(), capture.clone());
        let started = Instant::now();
        let session = Arc::new(Session::new(started, Local::now(), "Finder".to_string(), cache, 5));
        let source = Arc::new(FixedTitle(Mutex::new(title.to_string())));
        let oracle = TitleOracle::new(source, 1, Duration::ZERO);
        let monitor = PointerMonitor::new(session.clone(), oracle, settings());
        (monitor, session, capture, started)
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn press_release_becomes_click() {
        let (mut monitor, session, capture, base) = monitor("Editor");
        let down = ButtonTransition::at(MouseButton::Left, true, Point::new(10, 10), at(base, 100));
        let up = ButtonTransition::at(MouseButton::Left, false, Point::new(10, 10), at(base, 150));

        assert!(monitor.handle(down).is_none());
        let action = monitor.handle(up).expect("action");
        assert_eq!(action.kind, ActionKind::LeftClick);
        assert_eq!(action.sequence_index, 1);
        assert_eq!(action.kind_sequence_index, 1);
        assert_eq!(action.window_title, "Editor");
        assert_eq!(
            action.gesture,
            Gesture::Click {
                time: Duration::from_millis(150),
                position: Point::new(10, 10),
            }
        );
        assert_eq!(session.action_count(), 1);
        assert_eq!(capture.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_without_press_is_dropped() {
        let (mut monitor, session, _, base) = monitor("Editor");
        let up = ButtonTransition::at(MouseButton::Right, false, Point::new(1, 1), at(base, 10));
        assert!(monitor.handle(up).is_none());
        assert_eq!(session.action_count(), 0);
    }

    #[test]
    fn events_after_stop_are_dropped() {
        let (mut monitor, session, _, _) = monitor("Editor");
        session.finish();
        let later = Instant::now() + Duration::from_millis(10);
        let down = ButtonTransition::at(MouseButton::Left, true, Point::new(1, 1), later);
        let up = ButtonTransition::at(MouseButton::Left, false, Point::new(1, 1), later);
        assert!(monitor.handle(down).is_none());
        assert!(monitor.handle(up).is_none());
        assert_eq!(session.action_count(), 0);
    }

    #[test]
    fn unresolved_title_falls_back_to_last_known() {
        let (mut monitor, session, capture, base) = monitor(UNKNOWN_TITLE);
        let down = ButtonTransition::at(MouseButton::Left, true, Point::new(5, 5), at(base, 10));
        let up = ButtonTransition::at(MouseButton::Left, false, Point::new(5, 5), at(base, 20));
        monitor.handle(down);
        let action = monitor.handle(up).expect("action");
        assert_eq!(action.window_title, "Finder");
        assert_ne!(action.window_title, UNKNOWN_TITLE);
        assert_eq!(capture.0.load(Ordering::SeqCst), 0);
        assert!(session.screenshotted().is_empty());
    }

    #[test]
    fn run_drains_events_delivered_before_stop() {
        let (monitor, session, _, base) = monitor("Editor");
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(ButtonTransition::at(MouseButton::Left, true, Point::new(1, 1), at(base, 1)))
            .unwrap();
        tx.send(ButtonTransition::at(MouseButton::Left, false, Point::new(1, 1), at(base, 2)))
            .unwrap();

        let shutdown = ShutdownSignal::new();
        std::thread::sleep(Duration::from_millis(5));
        session.finish();
        shutdown.cancel();
        monitor.run(rx, shutdown);

        assert_eq!(session.action_count(), 1);
    }
}
