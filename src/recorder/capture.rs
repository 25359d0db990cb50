use std::{io, path::Path};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture failed: {0}")]
    CgImage(String),
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Grabs the whole screen and writes it as a PNG at `output`.
pub trait ScreenCapture: Send + Sync {
    fn capture_screen(&self, output: &Path) -> Result<(), CaptureError>;
}
