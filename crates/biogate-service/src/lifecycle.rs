//! Per-request state machine
//!
//! `Created -> PermissionChecked -> (FastFailed | Dispatched) -> Completed`
//!
//! `FastFailed` and `Completed` are terminal. A request rejected by policy is
//! dropped in `Created` or `PermissionChecked`; callers resubmit a new request.

use biogate_core::{BiometricError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Lifecycle state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    /// Request received
    Created,
    /// Gate evaluated without a hard failure
    PermissionChecked,
    /// Receiver notified of a soft failure; no session was started
    FastFailed,
    /// Forwarded to the authority
    Dispatched,
    /// Authority accepted the request
    Completed,
}

impl RequestState {
    /// Returns `true` for states with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FastFailed | Self::Completed)
    }

    /// Whether `self -> next` is a valid transition
    pub fn can_transition_to(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::PermissionChecked)
                | (Self::PermissionChecked, Self::FastFailed)
                | (Self::PermissionChecked, Self::Dispatched)
                | (Self::Dispatched, Self::Completed)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::PermissionChecked => "permission-checked",
            Self::FastFailed => "fast-failed",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Tracks the state of a single request through the router
#[derive(Debug)]
pub struct RequestLifecycle {
    operation: &'static str,
    state: RequestState,
}

impl RequestLifecycle {
    /// New request for `operation`
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: RequestState::Created,
        }
    }

    /// Current state
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&mut self, next: RequestState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BiometricError::internal(format!(
                "{}: invalid request transition {} -> {next}",
                self.operation, self.state
            )));
        }
        trace!(operation = self.operation, from = %self.state, to = %next, "request transition");
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RequestState; 5] = [
        RequestState::Created,
        RequestState::PermissionChecked,
        RequestState::FastFailed,
        RequestState::Dispatched,
        RequestState::Completed,
    ];

    #[test]
    fn test_happy_path() {
        let mut lifecycle = RequestLifecycle::new("authenticate");
        lifecycle.advance(RequestState::PermissionChecked).unwrap();
        lifecycle.advance(RequestState::Dispatched).unwrap();
        lifecycle.advance(RequestState::Completed).unwrap();
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_fast_fail_path() {
        let mut lifecycle = RequestLifecycle::new("authenticate");
        lifecycle.advance(RequestState::PermissionChecked).unwrap();
        lifecycle.advance(RequestState::FastFailed).unwrap();
        assert!(lifecycle.advance(RequestState::Dispatched).is_err());
        assert_eq!(lifecycle.state(), RequestState::FastFailed);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in ALL.iter().filter(|state| state.is_terminal()) {
            for next in ALL {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_dispatch_requires_permission_check() {
        let mut lifecycle = RequestLifecycle::new("authenticate");
        let err = lifecycle.advance(RequestState::Dispatched).unwrap_err();
        assert!(err.to_string().contains("created -> dispatched"));
    }
}
