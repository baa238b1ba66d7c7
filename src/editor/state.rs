use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Ready,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BaseImageLoaded,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTransition {
    pub from: SessionState,
    pub event: SessionEvent,
    pub to: SessionState,
}

#[derive(Debug, Error)]
pub enum SessionStateError {
    #[error("invalid session transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },
}

#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
    history: Vec<SessionTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[SessionTransition] {
        &self.history
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    /// Replacing the base image while Ready is allowed; nothing leaves Closed.
    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            (SessionState::Loading | SessionState::Ready, BaseImageLoaded) => {
                Some(SessionState::Ready)
            }
            (SessionState::Loading | SessionState::Ready, Close) => Some(SessionState::Closed),
            (SessionState::Closed, _) => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> Result<SessionState, SessionStateError> {
        tracing::debug!(from = ?self.state, event = ?event, "request session transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            SessionStateError::InvalidTransition { from, event }
        })?;

        self.history.push(SessionTransition {
            from: self.state,
            event,
            to: next,
        });
        self.state = next;
        Ok(next)
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
