//! Permission and policy gate
//!
//! Authenticate-style requests are checked in a fixed order and the first
//! failure wins:
//!
//! 1. identity: cross-user requests need the internal permission, same-user
//!    requests need `USE_BIOMETRIC` or the legacy `USE_FINGERPRINT`
//! 2. app-ops accounting
//! 3. argument presence
//! 4. foreground attribution
//! 5. prompt option privileges
//!
//! Steps 1, 2 and 5 fail hard with [`BiometricError::PolicyViolation`].
//! Steps 3 and 4 are soft: the gate returns [`GateOutcome::FastFail`] and the
//! router notifies the receiver instead of raising.

use biogate_core::effects::{BiometricServiceReceiver, Permission, PolicyEffects};
use biogate_core::{
    BiometricError, CallerIdentity, ClientToken, PromptConfig, RequestContext, Result, UserId,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const AUTHENTICATE_OP_REASON: &str = "authenticate()";

/// Raw arguments of an authenticate call, any of which may be missing
#[derive(Clone)]
pub struct AuthenticateRequest<'a> {
    /// Client token
    pub token: Option<ClientToken>,
    /// Operation id bound to the session
    pub session_id: i64,
    /// User to authenticate
    pub user_id: UserId,
    /// Receiver for results
    pub receiver: Option<Arc<dyn BiometricServiceReceiver>>,
    /// Calling package
    pub package: Option<&'a str>,
    /// Prompt configuration
    pub prompt: Option<&'a PromptConfig>,
}

impl fmt::Debug for AuthenticateRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("token", &self.token)
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("receiver", &self.receiver.is_some())
            .field("package", &self.package)
            .field("prompt", &self.prompt)
            .finish()
    }
}

/// Authenticate arguments that passed every gate step
#[derive(Clone)]
pub struct ValidatedAuthenticate<'a> {
    /// Client token
    pub token: ClientToken,
    /// Operation id bound to the session
    pub session_id: i64,
    /// User to authenticate
    pub user_id: UserId,
    /// Receiver for results
    pub receiver: Arc<dyn BiometricServiceReceiver>,
    /// Calling package
    pub package: &'a str,
    /// Prompt configuration
    pub prompt: &'a PromptConfig,
    /// Request context captured at the gate
    pub context: RequestContext,
}

impl fmt::Debug for ValidatedAuthenticate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedAuthenticate")
            .field("token", &self.token)
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("package", &self.package)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Why a request was fast-failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastFailReason {
    /// Token, receiver, package or prompt missing
    MissingArguments {
        /// Names of the missing arguments
        missing: Vec<&'static str>,
    },
    /// Caller is not attributable to a foreground process
    NotForeground {
        /// Calling package
        package: String,
    },
}

impl FastFailReason {
    /// Equivalent error for logs and reports
    pub fn to_error(&self) -> BiometricError {
        BiometricError::validation(self.to_string())
    }
}

impl fmt::Display for FastFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArguments { missing } => {
                write!(f, "missing arguments: {}", missing.join(", "))
            }
            Self::NotForeground { package } => {
                write!(f, "{package} is not running in the foreground")
            }
        }
    }
}

/// Result of evaluating an authenticate request
#[derive(Debug, Clone)]
pub enum GateOutcome<'a> {
    /// All checks passed
    Proceed(ValidatedAuthenticate<'a>),
    /// Soft failure; the receiver must be notified
    FastFail(FastFailReason),
}

/// Evaluates permission and policy checks against injected effects
#[derive(Debug, Clone)]
pub struct PermissionGate<E> {
    effects: E,
}

impl<E: PolicyEffects> PermissionGate<E> {
    /// Gate consulting `effects`
    pub fn new(effects: E) -> Self {
        Self { effects }
    }

    /// Underlying effects
    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Identity of the current caller
    pub fn caller(&self) -> CallerIdentity {
        self.effects.calling_identity()
    }

    /// Require `USE_BIOMETRIC` or the legacy `USE_FINGERPRINT`.
    pub fn enforce_biometric_permission(&self) -> Result<()> {
        if self
            .effects
            .check_calling_or_self_permission(Permission::UseFingerprint)
        {
            return Ok(());
        }
        self.enforce(Permission::UseBiometric)
    }

    /// Require the internal permission.
    pub fn enforce_internal(&self) -> Result<()> {
        self.enforce(Permission::UseBiometricInternal)
    }

    /// Require the test permission.
    pub fn enforce_test(&self) -> Result<()> {
        self.enforce(Permission::TestBiometric)
    }

    /// Same-user callers need the biometric permission, anyone acting on
    /// another user needs the internal one.
    pub fn enforce_user_access(&self, caller: CallerIdentity, target_user: UserId) -> Result<()> {
        if target_user == caller.user_id {
            self.enforce_biometric_permission()
        } else {
            debug!(%caller, target_user, "cross-user request");
            self.enforce_internal()
        }
    }

    /// Run all five checks for an authenticate request.
    pub fn check_authenticate<'a>(
        &self,
        caller: CallerIdentity,
        request: &AuthenticateRequest<'a>,
    ) -> Result<GateOutcome<'a>> {
        self.enforce_user_access(caller, request.user_id)?;

        let mode = self
            .effects
            .note_op(caller.uid, request.package, AUTHENTICATE_OP_REASON);
        if !mode.is_allowed() {
            let package = request.package.unwrap_or("<unknown>");
            warn!(%caller, package, ?mode, "app op denied");
            return Err(BiometricError::policy_violation(format!(
                "biometric app op denied for {package}"
            )));
        }

        let (Some(token), Some(receiver), Some(package), Some(prompt)) = (
            request.token,
            request.receiver.clone(),
            request.package,
            request.prompt,
        ) else {
            return Ok(GateOutcome::FastFail(FastFailReason::MissingArguments {
                missing: missing_arguments(request),
            }));
        };

        if !self.effects.is_foreground(caller.uid, caller.pid) {
            return Ok(GateOutcome::FastFail(FastFailReason::NotForeground {
                package: package.to_string(),
            }));
        }

        self.enforce_prompt_privileges(prompt)?;

        Ok(GateOutcome::Proceed(ValidatedAuthenticate {
            token,
            session_id: request.session_id,
            user_id: request.user_id,
            receiver,
            package,
            prompt,
            context: RequestContext::new(caller, prompt),
        }))
    }

    /// Test-only options need the test or internal permission; private options
    /// always need the internal permission.
    pub fn enforce_prompt_privileges(&self, prompt: &PromptConfig) -> Result<()> {
        if prompt.contains_test_configurations()
            && !self
                .effects
                .check_calling_or_self_permission(Permission::TestBiometric)
        {
            self.enforce_internal()?;
        }
        if prompt.contains_private_api_configurations() {
            self.enforce_internal()?;
        }
        Ok(())
    }

    fn enforce(&self, permission: Permission) -> Result<()> {
        if self.effects.check_calling_or_self_permission(permission) {
            return Ok(());
        }
        warn!(%permission, caller = %self.caller(), "permission denied");
        Err(BiometricError::policy_violation(format!(
            "must have {permission} permission"
        )))
    }
}

fn missing_arguments(request: &AuthenticateRequest<'_>) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if request.token.is_none() {
        missing.push("token");
    }
    if request.receiver.is_none() {
        missing.push("receiver");
    }
    if request.package.is_none() {
        missing.push("package");
    }
    if request.prompt.is_none() {
        missing.push("prompt");
    }
    missing
}
