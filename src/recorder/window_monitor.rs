use std::sync::Arc;
use std::time::{Duration, Instant};

use super::session::Session;
use super::shutdown::ShutdownSignal;
use super::window_title::TitleOracle;

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Polls the foreground title and keeps the session's transition history.
///
/// Diagnostic only; action attribution does not depend on it beyond the
/// last-known-title fallback.
pub struct WindowTitleMonitor {
    session: Arc<Session>,
    oracle: TitleOracle,
    interval: Duration,
    last_title: Option<String>,
}

impl WindowTitleMonitor {
    pub fn new(session: Arc<Session>, oracle: TitleOracle, interval: Duration) -> Self {
        Self {
            session,
            oracle,
            interval,
            last_title: None,
        }
    }

    /// Returns true when the title changed since the previous poll.
    pub fn poll_once(&mut self) -> bool {
        let title = self.oracle.resolve();
        if self.last_title.as_deref() == Some(title.as_str()) {
            return false;
        }
        let at = self.session.elapsed(Instant::now());
        log::debug!("foreground title changed at {:.3}s: '{title}'", at.as_secs_f64());
        self.session.record_title(at, title.clone());
        self.last_title = Some(title);
        true
    }

    pub fn run(mut self, shutdown: ShutdownSignal) {
        while self.session.is_active() {
            self.poll_once();
            if shutdown.sleep(self.interval) {
                break;
            }
        }
        log::debug!("title monitor exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::capture::{CaptureError, ScreenCapture};
    use crate::recorder::screenshot_cache::ScreenshotCache;
    use crate::recorder::window_title::{ForegroundWindow, WindowError};
    use chrono::Local;
    use std::path::Path;
    use std::sync::Mutex;

    struct Titles(Mutex<Vec<&'static str>>);

    impl ForegroundWindow for Titles {
        fn foreground_title(&self) -> Result<String, WindowError> {
            let mut titles = self.0.lock().unwrap();
            let title = if titles.len() > 1 { titles.remove(0) } else { titles[0] };
            Ok(title.to_string())
        }
    }

    struct NoCapture;

    impl ScreenCapture for NoCapture {
        fn capture_screen(&self, _output: &Path) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    fn session() -> Arc<Session> {
        let cache = ScreenshotCache::new("shots".into(), Arc::new(NoCapture));
        Arc::new(Session::new(Instant::now(), Local::now(), "Finder".to_string(), cache, 5))
    }

    #[test]
    fn records_only_transitions() {
        let session = session();
        let source = Arc::new(Titles(Mutex::new(vec!["Mail", "Mail", "Notes", "Notes"])));
        let oracle = TitleOracle::new(source, 1, Duration::ZERO);
        let mut monitor = WindowTitleMonitor::new(session.clone(), oracle, POLL_INTERVAL);

        let changes: Vec<bool> = (0..4).map(|_| monitor.poll_once()).collect();
        assert_eq!(changes, [true, false, true, false]);
        let titles: Vec<String> = session.title_history().into_iter().map(|(_, t)| t).collect();
        assert_eq!(titles, ["Mail", "Notes"]);
    }

    #[test]
    fn run_stops_promptly_on_cancel() {
        let session = session();
        let source = Arc::new(Titles(Mutex::new(vec!["Mail"])));
        let oracle = TitleOracle::new(source, 1, Duration::ZERO);
        let monitor = WindowTitleMonitor::new(session.clone(), oracle, Duration::from_secs(30));
        let shutdown = ShutdownSignal::new();

        let worker = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || monitor.run(shutdown))
        };
        std::thread::sleep(Duration::from_millis(20));
        let started = Instant::now();
        session.finish();
        shutdown.cancel();
        worker.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(session.title_history().len(), 1);
    }
}
