//! Error taxonomy for the match service
//!
//! Validation, state, conflict, and not-found failures are deterministic
//! given the current aggregate and are surfaced directly to the caller with
//! a machine-checkable kind; they are never retried. Internal failures are
//! logged with context and surfaced opaquely.

use crate::ids::PlayerId;
use thiserror::Error;

/// Top-level error for all engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// Malformed input: out-of-range coordinates, repeat shot
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong match state for the operation, or acting out of turn
    #[error("State error: {reason}")]
    State {
        reason: String,
        /// Current turn holder, included on out-of-turn shots for diagnostics
        turn_holder: Option<PlayerId>,
    },

    /// Joining one's own open match, or a concurrent-write rejection
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence failure or placement generation exhaustion
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// State error with no turn context
    pub fn state(reason: impl Into<String>) -> Self {
        GameError::State { reason: reason.into(), turn_holder: None }
    }

    /// Out-of-turn state error carrying the current turn holder
    pub fn not_your_turn(turn_holder: Option<PlayerId>) -> Self {
        GameError::State { reason: "not your turn".to_string(), turn_holder }
    }
}
