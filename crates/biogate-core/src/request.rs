//! Per-call request types
//!
//! Everything here lives for the duration of one incoming call and is never
//! persisted.

use crate::modality::ModalityBitmask;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User id
pub type UserId = i32;

/// Identity of the process on the other side of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// User the caller runs as
    pub user_id: UserId,
    /// Caller uid
    pub uid: u32,
    /// Caller pid
    pub pid: u32,
}

impl CallerIdentity {
    /// Create a caller identity
    pub fn new(user_id: UserId, uid: u32, pid: u32) -> Self {
        Self { user_id, uid, pid }
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user={} uid={} pid={}", self.user_id, self.uid, self.pid)
    }
}

/// Opaque client token identifying the caller's prompt instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(u64);

impl ClientToken {
    /// Wrap a raw token value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw token value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Opaque id assigned by the authority to a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(i64);

impl RequestId {
    /// Sentinel returned when a request was fast-failed and never dispatched
    pub const NO_SESSION: RequestId = RequestId(-1);

    /// Wrap a raw request id
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw request id
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prompt configuration supplied by the caller of `authenticate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Prompt title
    pub title: String,
    /// Optional subtitle
    pub subtitle: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Text of the negative button
    pub negative_button_text: Option<String>,
    /// Authenticators the caller is willing to accept
    pub authenticators: ModalityBitmask,
    /// Whether the caller wants explicit confirmation after a passive match
    pub confirmation_requested: bool,

    // Test-only options
    /// Restrict the prompt to these sensor ids
    pub allowed_sensor_ids: Vec<i32>,
    /// Allow authentication while the caller is not visible
    pub allow_background_authentication: bool,

    // Private options
    /// Hide biometrics when a device policy disables them
    pub disallow_biometrics_if_policy_exists: bool,
    /// Deliver system events to the receiver
    pub receive_system_events: bool,
    /// Authenticate even when nothing is enrolled
    pub ignore_enrollment_state: bool,
}

impl PromptConfig {
    /// Create a prompt with a title and accepted authenticators
    pub fn new(title: impl Into<String>, authenticators: ModalityBitmask) -> Self {
        Self {
            title: title.into(),
            authenticators,
            ..Self::default()
        }
    }

    /// Returns `true` if any test-only option is set.
    pub fn contains_test_configurations(&self) -> bool {
        !self.allowed_sensor_ids.is_empty() || self.allow_background_authentication
    }

    /// Returns `true` if any non-public option is set.
    pub fn contains_private_api_configurations(&self) -> bool {
        self.disallow_biometrics_if_policy_exists
            || self.receive_system_events
            || self.ignore_enrollment_state
    }
}

/// Read-only view of one incoming call, built by the policy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// User of the caller
    pub caller_user_id: UserId,
    /// Caller uid
    pub caller_uid: u32,
    /// Caller pid
    pub caller_pid: u32,
    /// Authenticators requested by the caller
    pub requested_strengths: ModalityBitmask,
    /// Prompt carries non-public options
    pub contains_private_config: bool,
    /// Prompt carries test-only options
    pub contains_test_config: bool,
}

impl RequestContext {
    /// Build a context from the caller identity and its prompt
    pub fn new(caller: CallerIdentity, prompt: &PromptConfig) -> Self {
        Self {
            caller_user_id: caller.user_id,
            caller_uid: caller.uid,
            caller_pid: caller.pid,
            requested_strengths: prompt.authenticators,
            contains_private_config: prompt.contains_private_api_configurations(),
            contains_test_config: prompt.contains_test_configurations(),
        }
    }
}

/// Availability answer from `can_authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiometricStatus {
    /// The requested authenticators can be used
    Success,
    /// Hardware is present but currently unavailable
    HardwareUnavailable,
    /// Nothing is enrolled for the requested authenticators
    NoneEnrolled,
    /// No hardware for the requested authenticators
    NoHardware,
    /// A sensor is present but known to be vulnerable
    SecurityUpdateRequired,
}

impl BiometricStatus {
    /// Numeric result code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::HardwareUnavailable => 1,
            Self::NoneEnrolled => 11,
            Self::NoHardware => 12,
            Self::SecurityUpdateRequired => 15,
        }
    }
}

/// Error codes delivered through a receiver's `on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverErrorCode {
    /// The operation was canceled before it could start
    Canceled,
    /// Hardware unavailable
    HardwareUnavailable,
    /// Vendor-specific error
    Vendor,
}

impl ReceiverErrorCode {
    /// Numeric error code
    pub fn code(self) -> i32 {
        match self {
            Self::HardwareUnavailable => 1,
            Self::Canceled => 5,
            Self::Vendor => 8,
        }
    }
}
