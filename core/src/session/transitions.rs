//! Session transition rules.

use super::types::SessionStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("{operation} requires a {required:?} session (current: {current:?})")]
    WrongState {
        operation: &'static str,
        required: SessionStatus,
        current: SessionStatus,
    },
}

pub struct SessionTransition;

impl SessionTransition {
    pub fn validate(from: SessionStatus, to: SessionStatus) -> Result<(), TransitionError> {
        use SessionStatus::*;

        let is_valid = match (from, to) {
            // startup: stored token found, or nothing to resolve
            (Uninitialized, Resolving) | (Uninitialized, Anonymous) => true,

            // "who am I" settled
            (Resolving, Authenticated) | (Resolving, Anonymous) => true,

            // login / register, logout
            (Anonymous, Authenticated) | (Authenticated, Anonymous) => true,

            // profile replaced or token rotated
            (Authenticated, Authenticated) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// Guard for operations that are only meaningful in one state.
    pub fn require(
        operation: &'static str,
        current: SessionStatus,
        required: SessionStatus,
    ) -> Result<(), TransitionError> {
        if current == required {
            Ok(())
        } else {
            Err(TransitionError::WrongState {
                operation,
                required,
                current,
            })
        }
    }
}
