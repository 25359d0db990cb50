//! Press/release classification into clicks and drags.

use std::time::Duration;

use super::click_event::MouseButton;
use super::geometry::Point;
use super::types::{ActionCandidate, ActionKind, Gesture};

pub const DRAG_MIN_DURATION: Duration = Duration::from_millis(150);
pub const DRAG_MIN_DISTANCE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragThresholds {
    pub min_duration: Duration,
    /// Per-axis displacement, in points.
    pub min_distance: i32,
}

impl Default for DragThresholds {
    fn default() -> Self {
        Self {
            min_duration: DRAG_MIN_DURATION,
            min_distance: DRAG_MIN_DISTANCE,
        }
    }
}

/// Button-down half of a gesture; `at` is relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressRecord {
    pub button: MouseButton,
    pub at: Duration,
    pub position: Point,
}

/// A gesture is a drag only when it lasts long enough AND moves far enough on
/// either axis. A zero-length gesture is always a click.
pub fn classify(
    press: &PressRecord,
    released_at: Duration,
    released_position: Point,
    thresholds: &DragThresholds,
) -> ActionCandidate {
    let held = released_at.saturating_sub(press.at);
    let dx = (released_position.x - press.position.x).abs();
    let dy = (released_position.y - press.position.y).abs();
    let drag = held >= thresholds.min_duration
        && (dx >= thresholds.min_distance || dy >= thresholds.min_distance);

    let gesture = if drag {
        Gesture::Drag {
            start_time: press.at,
            end_time: released_at,
            start_position: press.position,
            end_position: released_position,
        }
    } else {
        Gesture::Click {
            time: released_at,
            position: released_position,
        }
    };

    ActionCandidate {
        kind: ActionKind::new(press.button, drag),
        gesture,
    }
}
