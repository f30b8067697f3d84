//! Session Lifecycle State Machine
//!
//! Defines the one-directional lifecycle of a session:
//! `Created -> Active -> Closing -> Closed`.

use std::fmt;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Sockets bound, tasks not yet running
    Created,
    /// All background tasks running
    Active,
    /// Shutdown signalled, waiting for tasks to stop
    Closing,
    /// All tasks confirmed terminated
    Closed,
}

impl SessionState {
    /// Whether commands may still be submitted
    pub fn accepts_commands(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Listeners and scheduler spawned
    TasksStarted,
    /// Close requested by the owner
    CloseRequested,
    /// Every task has been joined
    TasksTerminated,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Success(SessionState),
    /// Transition was invalid from current state
    Invalid {
        from: SessionState,
        event: SessionEvent,
    },
}

impl TransitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionResult::Success(_))
    }
}

/// The lifecycle state machine for one session
#[derive(Debug)]
pub struct SessionStateMachine {
    current_state: SessionState,
    transitions: u32,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    /// Create a new state machine in Created state
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Created,
            transitions: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.current_state
    }

    /// Number of successful transitions so far
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: SessionEvent) -> TransitionResult {
        match self.get_next_state(event) {
            Some(state) => {
                self.current_state = state;
                self.transitions += 1;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    /// Get the next state for a given event, if the transition is valid
    fn get_next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self.current_state, event) {
            (Created, TasksStarted) => Some(Active),
            // A session that never started can still be closed
            (Created | Active, CloseRequested) => Some(Closing),
            (Closing, TasksTerminated) => Some(Closed),
            _ => None,
        }
    }
}

/// Check if a transition from one state to another is valid
pub fn is_valid_transition(from: SessionState, to: SessionState) -> bool {
    use SessionState::*;

    matches!(
        (from, to),
        (Created, Active) | (Created, Closing) | (Active, Closing) | (Closing, Closed)
    )
}
