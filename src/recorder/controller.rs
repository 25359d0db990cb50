//! Start/stop orchestration for a recording session.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use thiserror::Error;

use super::capture::ScreenCapture;
use super::click_event::{ListenerError, PointerEventSource};
use super::pointer_monitor::PointerMonitor;
use super::screenshot_cache::ScreenshotCache;
use super::session::{session_stamp, Session};
use super::shutdown::ShutdownSignal;
use super::state::{RecorderAction, RecorderState, RecorderStateError, SessionState};
use super::storage::{screenshot_folder_name, write_report, StorageError};
use super::window_monitor::WindowTitleMonitor;
use super::window_title::{ForegroundWindow, TitleOracle};
use crate::config::RecorderConfig;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to create screenshot folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start pointer listener: {0}")]
    Listener(#[from] ListenerError),
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
    #[error("failed to save session: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    State(#[from] RecorderStateError),
}

/// The OS facilities a session consumes.
pub struct Collaborators {
    pub pointer: Box<dyn PointerEventSource>,
    pub window: Arc<dyn ForegroundWindow>,
    pub capture: Arc<dyn ScreenCapture>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub report_path: PathBuf,
    pub screenshot_dir: PathBuf,
    pub action_count: usize,
    pub screenshot_count: usize,
    pub total_duration: Duration,
}

struct LiveSession {
    session: Arc<Session>,
    shutdown: ShutdownSignal,
    pointer: JoinHandle<()>,
    title: JoinHandle<()>,
    screenshot_dir: PathBuf,
}

pub struct SessionController {
    config: RecorderConfig,
    collaborators: Collaborators,
    state: RecorderState,
    live: Option<LiveSession>,
}

impl SessionController {
    pub fn new(config: RecorderConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            state: RecorderState::new(),
            live: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.current_state()
    }

    fn oracle(&self) -> TitleOracle {
        TitleOracle::new(
            Arc::clone(&self.collaborators.window),
            self.config.oracle_attempts,
            self.config.oracle_retry_delay(),
        )
    }

    /// Begin recording. Returns `Ok(false)` when a session is already live.
    pub fn start(&mut self) -> Result<bool, RecorderError> {
        if !self.state.can(RecorderAction::Start) {
            log::debug!("start ignored: already recording");
            return Ok(false);
        }

        let started = Instant::now();
        let started_at = Local::now();
        let stamp = session_stamp(&started_at);

        // Listener first: without it nothing is written to disk.
        let events = self.collaborators.pointer.start()?;

        let screenshot_dir = self.config.output_dir.join(screenshot_folder_name(&stamp));
        if let Err(source) = std::fs::create_dir_all(&screenshot_dir) {
            self.collaborators.pointer.stop();
            return Err(RecorderError::OutputDir {
                path: screenshot_dir,
                source,
            });
        }

        let oracle = self.oracle();
        let initial_title = oracle.resolve();
        log::info!("initial foreground window title: {initial_title}");

        let cache = ScreenshotCache::new(
            screenshot_dir.clone(),
            Arc::clone(&self.collaborators.capture),
        );
        let session = Arc::new(Session::new(
            started,
            started_at,
            initial_title,
            cache,
            self.config.title_history_capacity,
        ));
        let outcome = session.ensure_screenshot(session.initial_window_title());
        if !outcome.is_captured() {
            log::debug!("no initial screenshot: {outcome:?}");
        }

        let shutdown = ShutdownSignal::new();
        let pointer_monitor =
            PointerMonitor::new(Arc::clone(&session), oracle.clone(), self.config.pointer_settings());
        let pointer = spawn("pointer-monitor", {
            let shutdown = shutdown.clone();
            move || pointer_monitor.run(events, shutdown)
        });
        let pointer = match pointer {
            Ok(handle) => handle,
            Err(err) => {
                self.abort(&session, &shutdown);
                return Err(err);
            }
        };

        let title_monitor =
            WindowTitleMonitor::new(Arc::clone(&session), oracle, self.config.poll_interval());
        let title = spawn("title-monitor", {
            let shutdown = shutdown.clone();
            move || title_monitor.run(shutdown)
        });
        let title = match title {
            Ok(handle) => handle,
            Err(err) => {
                self.abort(&session, &shutdown);
                join("pointer-monitor", pointer);
                return Err(err);
            }
        };

        self.state.start()?;
        log::info!(
            "recording started; screenshots go to {}",
            screenshot_dir.display()
        );
        self.live = Some(LiveSession {
            session,
            shutdown,
            pointer,
            title,
            screenshot_dir,
        });
        Ok(true)
    }

    fn abort(&mut self, session: &Session, shutdown: &ShutdownSignal) {
        session.finish();
        self.collaborators.pointer.stop();
        shutdown.cancel();
    }

    /// End recording and write the report. Returns `Ok(None)` when idle.
    ///
    /// Both monitors are joined before anything is written, so an action
    /// still being resolved when stop arrives makes it into the report.
    pub fn stop(&mut self) -> Result<Option<SessionSummary>, RecorderError> {
        let Some(live) = self.live.take() else {
            log::debug!("stop ignored: not recording");
            return Ok(None);
        };

        let total_duration = live.session.finish().unwrap_or_default();
        self.collaborators.pointer.stop();
        live.shutdown.cancel();
        join("pointer-monitor", live.pointer);
        join("title-monitor", live.title);
        self.state.stop()?;

        for (at, title) in live.session.title_history() {
            log::debug!("title history: {:.3}s '{title}'", at.as_secs_f64());
        }

        let report = live.session.report();
        let report_path = write_report(&self.config.output_dir, &live.session.stamp(), &report)?;
        log::info!("session saved to {}", report_path.display());

        Ok(Some(SessionSummary {
            report_path,
            screenshot_dir: live.screenshot_dir,
            action_count: report.actions.len(),
            screenshot_count: live.session.screenshotted().len(),
            total_duration,
        }))
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.session.finish();
            self.collaborators.pointer.stop();
            live.shutdown.cancel();
            join("pointer-monitor", live.pointer);
            join("title-monitor", live.title);
        }
    }
}

fn spawn<F>(name: &'static str, work: F) -> Result<JoinHandle<()>, RecorderError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(work)
        .map_err(|source| RecorderError::Spawn { name, source })
}

fn join(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::warn!("{name} thread panicked");
    }
}
