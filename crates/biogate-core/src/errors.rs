//! Unified error system for Biogate
//!
//! A single error type shared by every crate in the workspace. The variants map
//! one-to-one onto how a failure must be surfaced to a caller:
//!
//! - `PolicyViolation` is a hard security failure and always crosses the call boundary.
//! - `ValidationFailure` is a soft failure: the router notifies the receiver and returns
//!   a sentinel instead of raising it.
//! - `Transport` is raised by remote collaborators and propagated unchanged.
//! - `ConfigurationInconsistency` is only ever logged.

use serde::{Deserialize, Serialize};

/// Unified error type for all Biogate operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BiometricError {
    /// Caller lacks a required capability or was denied by usage accounting
    #[error("Policy violation: {message}")]
    PolicyViolation {
        /// Error message naming the missing capability or denying policy
        message: String,
    },

    /// Malformed arguments or a caller that is not foreground
    #[error("Validation failure: {message}")]
    ValidationFailure {
        /// Error message describing the rejected request
        message: String,
    },

    /// The authority or a modality backend could not be reached
    #[error("Transport error: {message}")]
    Transport {
        /// Error message describing the transport failure
        message: String,
    },

    /// Sensor configuration and available backends disagree
    #[error("Configuration inconsistency: {message}")]
    ConfigurationInconsistency {
        /// Error message describing the mismatch
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl BiometricError {
    /// Create a policy violation error
    pub fn policy_violation(message: impl Into<String>) -> Self {
        Self::PolicyViolation {
            message: message.into(),
        }
    }

    /// Create a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a configuration inconsistency error
    pub fn configuration_inconsistency(message: impl Into<String>) -> Self {
        Self::ConfigurationInconsistency {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for failures that represent a security boundary violation.
    ///
    /// These must never be downgraded to a soft failure.
    pub fn is_security_failure(&self) -> bool {
        matches!(self, Self::PolicyViolation { .. })
    }

    /// Returns `true` if the failure came from an unreachable collaborator.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Standard Result type for Biogate operations
pub type Result<T> = std::result::Result<T, BiometricError>;

impl From<std::io::Error> for BiometricError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::policy_violation(err.to_string()),
            std::io::ErrorKind::NotFound | std::io::ErrorKind::InvalidData => {
                Self::invalid(err.to_string())
            }
            _ => Self::internal(err.to_string()),
        }
    }
}
