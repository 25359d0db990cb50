use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use super::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// One press or release of a pointer button, stamped when the OS delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonTransition {
    pub button: MouseButton,
    pub pressed: bool,
    pub position: Point,
    pub at: Instant,
}

impl ButtonTransition {
    pub fn new(button: MouseButton, pressed: bool, x: i32, y: i32) -> Self {
        Self::at(button, pressed, Point::new(x, y), Instant::now())
    }

    pub fn at(button: MouseButton, pressed: bool, position: Point, at: Instant) -> Self {
        Self {
            button,
            pressed,
            position,
            at,
        }
    }
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to create event tap; check accessibility permissions")]
    EventTap,
    #[error("failed to create run loop source")]
    RunLoopSource,
    #[error("timeout waiting for event tap setup")]
    SetupTimeout,
    #[error("pointer listener thread failed: {0}")]
    Thread(#[from] std::io::Error),
}

/// Source of global pointer button transitions.
///
/// `start` begins delivery and hands back the receiving end; `stop` ends it.
/// Once stopped, the receiver disconnects after any queued events are drained.
pub trait PointerEventSource: Send {
    fn start(&mut self) -> Result<Receiver<ButtonTransition>, ListenerError>;
    fn stop(&mut self);
}
