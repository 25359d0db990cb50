use std::path::Path;

use core_graphics::display::CGDisplay;
use core_graphics::image::CGImage;
use core_graphics::window::{
    create_image, kCGNullWindowID, kCGWindowImageBestResolution,
    kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
};
use image::RgbaImage;

use super::capture::{CaptureError, ScreenCapture};

/// Full-screen capture of the main display through CoreGraphics.
pub struct MainDisplayCapture;

impl ScreenCapture for MainDisplayCapture {
    fn capture_screen(&self, output: &Path) -> Result<(), CaptureError> {
        capture_main_display(output)
    }
}

pub fn capture_main_display(output_path: &Path) -> Result<(), CaptureError> {
    let bounds = CGDisplay::main().bounds();
    if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
        return Err(CaptureError::CgImage("main display has no area".to_string()));
    }

    let image = create_image(
        bounds,
        kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
        kCGNullWindowID,
        kCGWindowImageBestResolution,
    )
    .ok_or_else(|| CaptureError::CgImage("CGWindowListCreateImage returned null".to_string()))?;

    let img = to_rgba(&image)?;
    img.save(output_path)?;
    Ok(())
}

/// CGWindowListCreateImage returns BGRA (premultiplied); reorder to RGBA.
fn to_rgba(image: &CGImage) -> Result<RgbaImage, CaptureError> {
    let w = image.width();
    let h = image.height();
    if w == 0 || h == 0 {
        return Err(CaptureError::CgImage("empty CGImage".to_string()));
    }

    let bytes_per_row = image.bytes_per_row();
    let bytes_per_pixel = image.bits_per_pixel() / 8;
    if bytes_per_pixel < 4 {
        return Err(CaptureError::CgImage("unsupported pixel format".to_string()));
    }

    let data = image.data();
    let bytes = data.bytes();
    if bytes.len() < bytes_per_row.saturating_mul(h) {
        return Err(CaptureError::CgImage("CGImage buffer too small".to_string()));
    }

    let mut out = vec![0u8; w * h * 4];
    for row in 0..h {
        let src = &bytes[row * bytes_per_row..row * bytes_per_row + w * bytes_per_pixel];
        let dst = &mut out[row * w * 4..(row + 1) * w * 4];
        for (px, chunk) in dst.chunks_exact_mut(4).enumerate() {
            let si = px * bytes_per_pixel;
            chunk.copy_from_slice(&[src[si + 2], src[si + 1], src[si], src[si + 3]]);
        }
    }

    RgbaImage::from_raw(w as u32, h as u32, out)
        .ok_or_else(|| CaptureError::CgImage("failed to build image buffer".to_string()))
}
