use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderAction {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecorderStateError {
    #[error("cannot {action:?} while {from:?}")]
    InvalidTransition {
        from: SessionState,
        action: RecorderAction,
    },
}

pub struct RecorderState {
    state: SessionState,
}

impl RecorderState {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.state
    }

    fn transition(
        &mut self,
        allowed: &[SessionState],
        to: SessionState,
        action: RecorderAction,
    ) -> Result<(), RecorderStateError> {
        if allowed.contains(&self.state) {
            self.state = to;
            Ok(())
        } else {
            Err(RecorderStateError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    /// Check a transition without applying it.
    pub fn can(&self, action: RecorderAction) -> bool {
        match action {
            RecorderAction::Start => {
                matches!(self.state, SessionState::Idle | SessionState::Stopped)
            }
            RecorderAction::Stop => self.state == SessionState::Recording,
        }
    }

    pub fn start(&mut self) -> Result<(), RecorderStateError> {
        self.transition(
            &[SessionState::Idle, SessionState::Stopped],
            SessionState::Recording,
            RecorderAction::Start,
        )
    }

    pub fn stop(&mut self) -> Result<(), RecorderStateError> {
        self.transition(
            &[SessionState::Recording],
            SessionState::Stopped,
            RecorderAction::Stop,
        )
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::new()
    }
}
