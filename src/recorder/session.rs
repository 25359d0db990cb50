use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::geometry::{elapsed_since, seconds};
use super::screenshot_cache::{ScreenshotCache, ScreenshotOutcome};
use super::title_history::TitleHistory;
use super::types::{Action, ActionCandidate, ActionKind};
use super::window_title::is_resolved;

/// `YYYY-MM-DD-HH-MM-SS`, used for the report and screenshot folder names.
pub fn session_stamp(started_at: &DateTime<Local>) -> String {
    started_at.format("%Y-%m-%d-%H-%M-%S").to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ActionLog {
    actions: Vec<Action>,
    per_kind: HashMap<ActionKind, u32>,
}

impl ActionLog {
    /// Numbering is computed under the same borrow as the push.
    fn append(&mut self, candidate: ActionCandidate, window_title: String) -> Action {
        let kind_count = self.per_kind.entry(candidate.kind).or_insert(0);
        *kind_count += 1;
        let action = Action {
            sequence_index: self.actions.len() as u32 + 1,
            kind: candidate.kind,
            kind_sequence_index: *kind_count,
            window_title,
            gesture: candidate.gesture,
        };
        self.actions.push(action.clone());
        action
    }
}

/// State of the one live recording.
///
/// Shared as `Arc<Session>` between the controller and both monitors. Only
/// the pointer monitor appends actions or takes per-action screenshots.
pub struct Session {
    started: Instant,
    started_at: DateTime<Local>,
    initial_window_title: String,
    active: AtomicBool,
    stopped: OnceLock<Instant>,
    actions: Mutex<ActionLog>,
    screenshots: Mutex<ScreenshotCache>,
    title_history: Mutex<TitleHistory>,
}

impl Session {
    pub fn new(
        started: Instant,
        started_at: DateTime<Local>,
        initial_window_title: String,
        screenshots: ScreenshotCache,
        history_capacity: usize,
    ) -> Self {
        Self {
            started,
            started_at,
            initial_window_title,
            active: AtomicBool::new(true),
            stopped: OnceLock::new(),
            actions: Mutex::new(ActionLog::default()),
            screenshots: Mutex::new(screenshots),
            title_history: Mutex::new(TitleHistory::new(history_capacity)),
        }
    }

    pub fn stamp(&self) -> String {
        session_stamp(&self.started_at)
    }

    pub fn initial_window_title(&self) -> &str {
        &self.initial_window_title
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Offset of `at` from the session start.
    pub fn elapsed(&self, at: Instant) -> Duration {
        elapsed_since(self.started, at)
    }

    /// Whether an event delivered at `at` belongs to this session. After stop,
    /// only events delivered before the stop instant are accepted.
    pub fn accepts(&self, at: Instant) -> bool {
        match self.stopped.get() {
            Some(stopped) => at <= *stopped,
            None => self.is_active(),
        }
    }

    /// End the session and return its total duration; `None` if already ended.
    pub fn finish(&self) -> Option<Duration> {
        let now = Instant::now();
        if self.stopped.set(now).is_err() {
            return None;
        }
        self.active.store(false, Ordering::SeqCst);
        Some(elapsed_since(self.started, now))
    }

    pub fn total_duration(&self) -> Option<Duration> {
        self.stopped.get().map(|stopped| elapsed_since(self.started, *stopped))
    }

    pub fn record_action(&self, candidate: ActionCandidate, window_title: String) -> Action {
        lock(&self.actions).append(candidate, window_title)
    }

    pub fn ensure_screenshot(&self, title: &str) -> ScreenshotOutcome {
        lock(&self.screenshots).ensure_captured(title)
    }

    pub fn record_title(&self, at: Duration, title: String) {
        lock(&self.title_history).push(at, title);
    }

    /// Best real title seen so far: the latest polled transition, then the
    /// previous action, then the initial title.
    pub fn last_known_title(&self) -> Option<String> {
        if let Some(title) = lock(&self.title_history).last_resolved() {
            return Some(title.to_string());
        }
        let previous = lock(&self.actions)
            .actions
            .last()
            .map(|action| action.window_title.clone())
            .filter(|title| is_resolved(title));
        previous.or_else(|| {
            is_resolved(&self.initial_window_title).then(|| self.initial_window_title.clone())
        })
    }

    pub fn actions(&self) -> Vec<Action> {
        lock(&self.actions).actions.clone()
    }

    pub fn action_count(&self) -> usize {
        lock(&self.actions).actions.len()
    }

    pub fn screenshotted(&self) -> HashSet<String> {
        lock(&self.screenshots).captured().clone()
    }

    pub fn title_history(&self) -> Vec<(Duration, String)> {
        lock(&self.title_history).entries().cloned().collect()
    }

    pub fn report(&self) -> SessionReport {
        let total = self
            .total_duration()
            .unwrap_or_else(|| self.elapsed(Instant::now()));
        SessionReport {
            session_start_time: self.started_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            total_duration: seconds(total),
            initial_foreground_window_title: self.initial_window_title.clone(),
            actions: self.actions(),
        }
    }
}

/// On-disk form of a finished session.
///
/// `session_start_time` is naive local time and always carries six
/// fractional digits, `.000000` included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_start_time: String,
    pub total_duration: f64,
    pub initial_foreground_window_title: String,
    pub actions: Vec<Action>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::capture::{CaptureError, ScreenCapture};
    use crate::recorder::geometry::Point;
    use crate::recorder::types::Gesture;
    use crate::recorder::window_title::UNKNOWN_TITLE;
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Arc;

    struct NoCapture;

    impl ScreenCapture for NoCapture {
        fn capture_screen(&self, _output: &Path) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    fn session(initial: &str) -> Session {
        let started_at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let cache = ScreenshotCache::new("shots".into(), Arc::new(NoCapture));
        Session::new(Instant::now(), started_at, initial.to_string(), cache, 5)
    }

    fn click(kind: ActionKind) -> ActionCandidate {
        ActionCandidate {
            kind,
            gesture: Gesture::Click {
                time: Duration::from_millis(10),
                position: Point::new(1, 1),
            },
        }
    }

    #[test]
    fn stamp_matches_file_naming() {
        assert_eq!(session("Finder").stamp(), "2024-03-09-14-05-07");
    }

    #[test]
    fn indices_are_contiguous_and_per_kind() {
        let session = session("Finder");
        let kinds = [
            ActionKind::LeftClick,
            ActionKind::RightClick,
            ActionKind::LeftClick,
            ActionKind::LeftDrag,
            ActionKind::LeftClick,
        ];
        for kind in kinds {
            session.record_action(click(kind), "Finder".to_string());
        }

        let actions = session.actions();
        for (i, action) in actions.iter().enumerate() {
            assert_eq!(action.sequence_index as usize, i + 1);
            let prior = actions[..i].iter().filter(|a| a.kind == action.kind).count();
            assert_eq!(action.kind_sequence_index as usize, prior + 1);
        }
        assert_eq!(actions[4].kind_sequence_index, 3);
    }

    #[test]
    fn finish_only_once() {
        let session = session("Finder");
        assert!(session.is_active());
        assert!(session.finish().is_some());
        assert!(!session.is_active());
        assert!(session.finish().is_none());
        assert!(session.total_duration().is_some());
    }

    #[test]
    fn accepts_events_delivered_before_stop() {
        let session = session("Finder");
        let before = Instant::now();
        session.finish();
        let after = Instant::now() + Duration::from_millis(5);
        assert!(session.accepts(before));
        assert!(!session.accepts(after));
    }

    #[test]
    fn last_known_title_prefers_history() {
        let session = session(UNKNOWN_TITLE);
        assert_eq!(session.last_known_title(), None);

        session.record_action(click(ActionKind::LeftClick), "Notes".to_string());
        assert_eq!(session.last_known_title().as_deref(), Some("Notes"));

        session.record_title(Duration::from_millis(100), "Mail".to_string());
        session.record_title(Duration::from_millis(150), UNKNOWN_TITLE.to_string());
        assert_eq!(session.last_known_title().as_deref(), Some("Mail"));
    }

    #[test]
    fn report_uses_wire_names() {
        let session = session("Finder");
        session.record_action(click(ActionKind::RightClick), "Finder".to_string());
        session.finish();

        let value = serde_json::to_value(session.report()).unwrap();
        assert_eq!(value["session_start_time"], "2024-03-09T14:05:07.000000");
        assert_eq!(value["initial_foreground_window_title"], "Finder");
        assert!(value["total_duration"].as_f64().unwrap() >= 0.0);
        assert_eq!(value["actions"][0]["click_type"], "right_click");
    }
}
