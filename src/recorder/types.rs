use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::click_event::MouseButton;
use super::geometry::{seconds, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    LeftClick,
    RightClick,
    LeftDrag,
    RightDrag,
}

impl ActionKind {
    pub fn new(button: MouseButton, drag: bool) -> Self {
        match (button, drag) {
            (MouseButton::Left, false) => ActionKind::LeftClick,
            (MouseButton::Right, false) => ActionKind::RightClick,
            (MouseButton::Left, true) => ActionKind::LeftDrag,
            (MouseButton::Right, true) => ActionKind::RightDrag,
        }
    }

    pub fn is_drag(self) -> bool {
        matches!(self, ActionKind::LeftDrag | ActionKind::RightDrag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::LeftClick => "left_click",
            ActionKind::RightClick => "right_click",
            ActionKind::LeftDrag => "left_drag",
            ActionKind::RightDrag => "right_drag",
        }
    }
}

/// Timing and geometry of an action; times are relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Click {
        time: Duration,
        position: Point,
    },
    Drag {
        start_time: Duration,
        end_time: Duration,
        start_position: Point,
        end_position: Point,
    },
}

/// A classified action that has not yet been attributed to a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCandidate {
    pub kind: ActionKind,
    pub gesture: Gesture,
}

/// One recorded click or drag.
///
/// Indices are 1-based and assigned when the action is appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ActionRecord", try_from = "ActionRecord")]
pub struct Action {
    pub sequence_index: u32,
    pub kind: ActionKind,
    pub kind_sequence_index: u32,
    pub window_title: String,
    pub gesture: Gesture,
}

/// Flat wire layout of an [`Action`]; fields not relevant to the kind are null.
#[derive(Debug, Serialize, Deserialize)]
struct ActionRecord {
    click_index: u32,
    click_type: ActionKind,
    type_click_index: u32,
    window_title: String,
    click_time: Option<f64>,
    start_time: Option<f64>,
    end_time: Option<f64>,
    start_coordinates: Option<Point>,
    end_coordinates: Option<Point>,
    click_coordinates: Option<Point>,
}

#[derive(Debug, Error)]
pub enum ActionRecordError {
    #[error("{kind} action is missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("invalid time value {0}")]
    InvalidTime(f64),
}

impl From<Action> for ActionRecord {
    fn from(action: Action) -> Self {
        let mut record = ActionRecord {
            click_index: action.sequence_index,
            click_type: action.kind,
            type_click_index: action.kind_sequence_index,
            window_title: action.window_title,
            click_time: None,
            start_time: None,
            end_time: None,
            start_coordinates: None,
            end_coordinates: None,
            click_coordinates: None,
        };
        match action.gesture {
            Gesture::Click { time, position } => {
                record.click_time = Some(seconds(time));
                record.click_coordinates = Some(position);
            }
            Gesture::Drag {
                start_time,
                end_time,
                start_position,
                end_position,
            } => {
                record.start_time = Some(seconds(start_time));
                record.end_time = Some(seconds(end_time));
                record.start_coordinates = Some(start_position);
                record.end_coordinates = Some(end_position);
            }
        }
        record
    }
}

fn required<T>(value: Option<T>, kind: ActionKind, field: &'static str) -> Result<T, ActionRecordError> {
    value.ok_or(ActionRecordError::MissingField {
        kind: kind.as_str(),
        field,
    })
}

fn duration_from_secs(value: f64) -> Result<Duration, ActionRecordError> {
    Duration::try_from_secs_f64(value).map_err(|_| ActionRecordError::InvalidTime(value))
}

impl TryFrom<ActionRecord> for Action {
    type Error = ActionRecordError;

    fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
        let kind = record.click_type;
        let gesture = if kind.is_drag() {
            Gesture::Drag {
                start_time: duration_from_secs(required(record.start_time, kind, "start_time")?)?,
                end_time: duration_from_secs(required(record.end_time, kind, "end_time")?)?,
                start_position: required(record.start_coordinates, kind, "start_coordinates")?,
                end_position: required(record.end_coordinates, kind, "end_coordinates")?,
            }
        } else {
            Gesture::Click {
                time: duration_from_secs(required(record.click_time, kind, "click_time")?)?,
                position: required(record.click_coordinates, kind, "click_coordinates")?,
            }
        };

        Ok(Action {
            sequence_index: record.click_index,
            kind,
            kind_sequence_index: record.type_click_index,
            window_title: record.window_title,
            gesture,
        })
    }
}

impl Action {
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            sequence_index: 1,
            kind: ActionKind::LeftClick,
            kind_sequence_index: 1,
            window_title: "Downloads".to_string(),
            gesture: Gesture::Click {
                time: Duration::from_millis(1500),
                position: Point::new(10, 20),
            },
        }
    }
}
