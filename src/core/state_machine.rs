//! State machine for tracking a batch publish run
//!
//! A run moves through `Idle → Filtering → Authenticating → Dispatching →
//! Aggregating → Done`. `Authenticating` is skipped when no credentials are
//! configured, and a failed login jumps straight to `Done`.

use crate::core::error::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Batch run state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Idle,
    Filtering,
    Authenticating,
    Dispatching,
    Aggregating,
    Done,
}

impl RunState {
    /// Whether `self → to` is a legal edge
    pub fn can_transition_to(self, to: RunState) -> bool {
        use RunState::*;

        matches!(
            (self, to),
            (Idle, Filtering)
                | (Filtering, Authenticating)
                | (Filtering, Dispatching)
                | (Authenticating, Dispatching)
                | (Authenticating, Done)
                | (Dispatching, Aggregating)
                | (Aggregating, Done)
        )
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    /// From state
    pub from: RunState,

    /// To state
    pub to: RunState,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

/// State machine for a single batch run
#[derive(Debug)]
pub struct RunStateMachine {
    current_state: RunState,
    transitions: Vec<StateTransition>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    /// Create a new state machine in `Idle`
    pub fn new() -> Self {
        Self {
            current_state: RunState::Idle,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state
    ///
    /// Fails with `InvalidTransition` on an illegal edge, including any
    /// attempt to leave or re-enter `Done`.
    pub fn transition(&mut self, to: RunState) -> Result<(), PublishError> {
        let from = self.current_state;
        if !from.can_transition_to(to) {
            return Err(PublishError::InvalidTransition { from, to });
        }

        tracing::debug!(?from, ?to, "run state transition");

        self.transitions.push(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        Ok(())
    }

    /// Get current state
    pub fn current_state(&self) -> RunState {
        self.current_state
    }

    /// Get transition history
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Whether the run has reached its terminal state
    pub fn is_done(&self) -> bool {
        self.current_state == RunState::Done
    }

    /// The states visited so far, starting with `Idle`
    pub fn path(&self) -> Vec<RunState> {
        std::iter::once(RunState::Idle)
            .chain(self.transitions.iter().map(|t| t.to))
            .collect()
    }
}
