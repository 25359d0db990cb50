use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Screen position in global display points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    (dx * dx + dy * dy).sqrt()
}

/// Time from `epoch` to `at`, clamped to zero when `at` precedes the epoch.
pub fn elapsed_since(epoch: Instant, at: Instant) -> Duration {
    at.saturating_duration_since(epoch)
}

pub fn seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}
