//! Caller identity, permission, usage accounting and process state
//!
//! These are local, infallible queries about the current caller. They are
//! grouped under the [`PolicyEffects`] supertrait so the router and gate can
//! take a single effects bundle.

use crate::request::CallerIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capabilities the gate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Ordinary biometric use
    UseBiometric,
    /// Legacy name accepted as equivalent to `UseBiometric`
    UseFingerprint,
    /// Internal callers (system UI, settings, keystore)
    UseBiometricInternal,
    /// Test harnesses
    TestBiometric,
}

impl Permission {
    /// Capability name as granted to packages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UseBiometric => "USE_BIOMETRIC",
            Self::UseFingerprint => "USE_FINGERPRINT",
            Self::UseBiometricInternal => "USE_BIOMETRIC_INTERNAL",
            Self::TestBiometric => "TEST_BIOMETRIC",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque record of the identity that was active before elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityToken {
    previous: CallerIdentity,
}

impl IdentityToken {
    /// Record the identity to restore later
    pub fn new(previous: CallerIdentity) -> Self {
        Self { previous }
    }

    /// Identity that was active before elevation
    pub fn previous(&self) -> CallerIdentity {
        self.previous
    }
}

/// Ambient calling identity.
pub trait IdentityEffects: Send + Sync {
    /// Identity of the current caller.
    fn calling_identity(&self) -> CallerIdentity;

    /// Switch to the service's own identity, returning what to restore.
    fn clear_calling_identity(&self) -> IdentityToken;

    /// Restore the identity captured by `clear_calling_identity`.
    fn restore_calling_identity(&self, token: IdentityToken);
}

/// Capability lookup for the current caller (or the service itself).
pub trait PermissionEffects: Send + Sync {
    /// Returns `true` if the caller or the service holds `permission`.
    fn check_calling_or_self_permission(&self, permission: Permission) -> bool;
}

/// Outcome of noting an app operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppOpMode {
    /// Operation allowed
    Allowed,
    /// Operation silently ignored
    Ignored,
    /// Operation refused
    Errored,
    /// No explicit decision; policy default applies
    Default,
}

impl AppOpMode {
    /// Only an explicit allow lets a request through.
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// App-usage accounting.
pub trait AppOpsEffects: Send + Sync {
    /// Record use of biometrics by `uid` on behalf of `package`.
    fn note_op(&self, uid: u32, package: Option<&str>, reason: &str) -> AppOpMode;
}

/// Process importance lookup.
pub trait ProcessStateEffects: Send + Sync {
    /// Returns `true` if the process is currently foreground-attributable.
    fn is_foreground(&self, uid: u32, pid: u32) -> bool;
}

/// Supertrait bundling every policy query the gate needs
pub trait PolicyEffects:
    IdentityEffects + PermissionEffects + AppOpsEffects + ProcessStateEffects
{
}

/// Automatic implementation for types that satisfy the required bounds
impl<T> PolicyEffects for T where
    T: IdentityEffects + PermissionEffects + AppOpsEffects + ProcessStateEffects
{
}
