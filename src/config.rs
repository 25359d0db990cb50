use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::recorder::classifier::DragThresholds;
use crate::recorder::pointer_monitor::PointerSettings;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "ACTIONCAP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Where `<stamp>.json` and `Screenshots - <stamp>/` are written.
    pub output_dir: PathBuf,
    pub start_hotkey: String,
    pub stop_hotkey: String,
    pub drag_min_duration_ms: u64,
    pub drag_min_distance_px: i32,
    pub settle_delay_ms: u64,
    pub title_poll_interval_ms: u64,
    pub oracle_attempts: u32,
    pub oracle_retry_delay_ms: u64,
    pub title_resolve_attempts: u32,
    pub title_resolve_retry_ms: u64,
    pub title_history_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            start_hotkey: "ctrl+ArrowUp".into(),
            stop_hotkey: "ctrl+ArrowDown".into(),
            drag_min_duration_ms: 150,
            drag_min_distance_px: 4,
            settle_delay_ms: 100,
            title_poll_interval_ms: 50,
            oracle_attempts: 3,
            oracle_retry_delay_ms: 100,
            title_resolve_attempts: 40,
            title_resolve_retry_ms: 50,
            title_history_capacity: 5,
        }
    }
}

impl RecorderConfig {
    /// Load from `$ACTIONCAP_CONFIG` or the per-user config dir.
    pub fn load() -> Result<Self> {
        match default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// A missing file means defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn drag_thresholds(&self) -> DragThresholds {
        DragThresholds {
            min_duration: Duration::from_millis(self.drag_min_duration_ms),
            min_distance: self.drag_min_distance_px,
        }
    }

    pub fn pointer_settings(&self) -> PointerSettings {
        PointerSettings {
            thresholds: self.drag_thresholds(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            resolve_attempts: self.title_resolve_attempts,
            resolve_retry: Duration::from_millis(self.title_resolve_retry_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.title_poll_interval_ms)
    }

    pub fn oracle_retry_delay(&self) -> Duration {
        Duration::from_millis(self.oracle_retry_delay_ms)
    }
}

fn default_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("actioncap").join("config.json"))
}
