use super::session::SessionReport;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn report_file_name(stamp: &str) -> String {
    format!("{stamp}.json")
}

pub fn screenshot_folder_name(stamp: &str) -> String {
    format!("Screenshots - {stamp}")
}

/// Write the report as pretty-printed UTF-8 JSON to `<dir>/<stamp>.json`.
pub fn write_report(dir: &Path, stamp: &str, report: &SessionReport) -> Result<PathBuf, StorageError> {
    let json = serde_json::to_string_pretty(report)?;
    let path = dir.join(report_file_name(stamp));
    std::fs::write(&path, json)?;
    Ok(path)
}
