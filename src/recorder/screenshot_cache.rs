//! One screenshot per distinct window title per session.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::capture::ScreenCapture;
use super::window_title::UNKNOWN_TITLE;

/// Characters that cannot appear in file names, with the token each becomes.
const INVALID_CHAR_TOKENS: [(char, &str); 10] = [
    ('#', "SHARP"),
    ('\\', "BACKSLASH"),
    ('/', "SLASH"),
    (':', "COLON"),
    ('*', "ASTERISK"),
    ('?', "QUESTION"),
    ('"', "QUOTE"),
    ('<', "LESS"),
    ('>', "GREATER"),
    ('|', "PIPE"),
];

/// Replace each file-name-invalid character with its alphabetic token.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match INVALID_CHAR_TOKENS.iter().find(|(invalid, _)| *invalid == c) {
            Some((_, token)) => out.push_str(token),
            None => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenshotOutcome {
    Captured(PathBuf),
    AlreadyCaptured,
    /// Empty or sentinel title; nothing written.
    InvalidTitle,
    /// Capture or write failed; the session continues without this image.
    Failed,
}

impl ScreenshotOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, ScreenshotOutcome::Captured(_))
    }
}

pub struct ScreenshotCache {
    folder: PathBuf,
    capture: Arc<dyn ScreenCapture>,
    captured: HashSet<String>,
}

impl ScreenshotCache {
    pub fn new(folder: PathBuf, capture: Arc<dyn ScreenCapture>) -> Self {
        Self {
            folder,
            capture,
            captured: HashSet::new(),
        }
    }

    pub fn path_for(&self, sanitized: &str) -> PathBuf {
        self.folder.join(format!("{sanitized}.png"))
    }

    /// Sanitized titles that have a screenshot on disk.
    pub fn captured(&self) -> &HashSet<String> {
        &self.captured
    }

    pub fn ensure_captured(&mut self, title: &str) -> ScreenshotOutcome {
        let sanitized = sanitize_title(title);
        if sanitized.is_empty() || sanitized == UNKNOWN_TITLE {
            return ScreenshotOutcome::InvalidTitle;
        }
        if self.captured.contains(&sanitized) {
            return ScreenshotOutcome::AlreadyCaptured;
        }

        let path = self.path_for(&sanitized);
        match self.capture.capture_screen(&path) {
            Ok(()) => {
                log::info!("screenshot taken: {}", path.display());
                self.captured.insert(sanitized);
                ScreenshotOutcome::Captured(path)
            }
            Err(err) => {
                log::warn!("screenshot for '{title}' failed: {err}");
                ScreenshotOutcome::Failed
            }
        }
    }
}
