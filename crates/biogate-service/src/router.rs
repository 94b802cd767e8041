//! Request router
//!
//! `AuthService` is the caller-facing front door. Every operation has the same
//! shape: the [`PermissionGate`] runs first, then the authority is called under
//! a [`ServiceIdentityScope`], and the caller's identity is restored before the
//! result is returned.
//!
//! The service holds no per-request mutable state and can be shared across
//! threads behind an `Arc`.

use crate::adapters::ProviderSet;
use crate::config::ServiceConfig;
use crate::gate::{AuthenticateRequest, FastFailReason, GateOutcome, PermissionGate};
use crate::identity::with_service_identity;
use crate::lifecycle::{RequestLifecycle, RequestState};
use crate::startup::{register_authenticators, RegistrationReport};
use biogate_core::effects::{
    BiometricAuthority, BiometricServiceReceiver, InvalidationCallback, KeyguardCallback,
    PolicyEffects, SensorNotifier, TestSessionCallback, TestSessionHandle,
};
use biogate_core::{
    resolve_display_category, resolve_prompt_category, BiometricStatus, ClientToken,
    DisplayCategory, LabelKind, ModalityBitmask, PromptConfig, ReceiverErrorCode,
    RequestId, Result, SensorProperties, UserId,
};
use biogate_effects::FallbackNotifier;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of an `authenticate` call that did not fail hard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticateOutcome {
    /// Request forwarded to the authority
    Dispatched {
        /// Id assigned by the authority
        request_id: RequestId,
    },
    /// Receiver was notified of a soft failure; nothing was dispatched
    FastFailed {
        /// Why the request was rejected
        reason: FastFailReason,
    },
}

impl AuthenticateOutcome {
    /// Request id, or [`RequestId::NO_SESSION`] for a fast-failed request
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Dispatched { request_id } => *request_id,
            Self::FastFailed { .. } => RequestId::NO_SESSION,
        }
    }

    /// Returns `true` if the request was fast-failed.
    pub fn is_fast_failed(&self) -> bool {
        matches!(self, Self::FastFailed { .. })
    }
}

/// Display string together with the category it was chosen for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    /// Resolved display category
    pub category: DisplayCategory,
    /// String for that category; `None` means use a neutral label
    pub text: Option<String>,
}

/// Caller-facing biometric authentication service
pub struct AuthService<E> {
    gate: PermissionGate<E>,
    authority: Arc<dyn BiometricAuthority>,
    config: ServiceConfig,
    notifier: Arc<dyn SensorNotifier>,
}

impl<E: fmt::Debug> fmt::Debug for AuthService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("gate", &self.gate)
            .field("ui_package", &self.config.ui_package)
            .field("notifier", &self.notifier.vendor())
            .finish_non_exhaustive()
    }
}

impl<E: PolicyEffects> AuthService<E> {
    /// Service with the fallback notifier. `config` also drives [`Self::on_start`].
    pub fn new(effects: E, authority: Arc<dyn BiometricAuthority>, config: ServiceConfig) -> Self {
        Self {
            gate: PermissionGate::new(effects),
            authority,
            config,
            notifier: Arc::new(FallbackNotifier),
        }
    }

    /// Use a vendor notifier chosen at startup
    pub fn with_notifier(mut self, notifier: Arc<dyn SensorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Configuration the service was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Permission gate
    pub fn gate(&self) -> &PermissionGate<E> {
        &self.gate
    }

    /// Selected vendor notifier
    pub fn notifier(&self) -> &Arc<dyn SensorNotifier> {
        &self.notifier
    }

    /// Register configured sensors with their backends, then start the notifier.
    pub fn on_start(&self, providers: &ProviderSet) -> RegistrationReport {
        let report = register_authenticators(&self.config, providers);
        self.notifier.on_service_started();
        info!(
            registered = report.registered_count(),
            rejected = report.rejected.len(),
            notifier = self.notifier.vendor(),
            "biometric service started"
        );
        report
    }

    fn elevated<T>(&self, f: impl FnOnce(&dyn BiometricAuthority) -> Result<T>) -> Result<T> {
        with_service_identity(self.gate.effects(), || f(self.authority.as_ref()))
    }

    /// Start an authentication session.
    ///
    /// Policy violations are returned as errors before the authority is
    /// reached. Missing arguments and background callers are fast-failed: the
    /// receiver gets exactly one canceled error and
    /// [`AuthenticateOutcome::FastFailed`] is returned.
    pub fn authenticate(
        &self,
        token: Option<ClientToken>,
        session_id: i64,
        user_id: UserId,
        receiver: Option<Arc<dyn BiometricServiceReceiver>>,
        package: Option<&str>,
        prompt: Option<&PromptConfig>,
    ) -> Result<AuthenticateOutcome> {
        let caller = self.gate.caller();
        let mut lifecycle = RequestLifecycle::new("authenticate");
        let request = AuthenticateRequest {
            token,
            session_id,
            user_id,
            receiver,
            package,
            prompt,
        };

        let outcome = self.gate.check_authenticate(caller, &request)?;
        lifecycle.advance(RequestState::PermissionChecked)?;

        let validated = match outcome {
            GateOutcome::Proceed(validated) => validated,
            GateOutcome::FastFail(reason) => {
                self.fast_fail(&reason, request.receiver.as_deref());
                lifecycle.advance(RequestState::FastFailed)?;
                return Ok(AuthenticateOutcome::FastFailed { reason });
            }
        };

        lifecycle.advance(RequestState::Dispatched)?;
        let request_id = self.elevated(|authority| {
            authority.authenticate(
                validated.token,
                validated.session_id,
                validated.user_id,
                validated.receiver.clone(),
                validated.package,
                validated.prompt,
            )
        })?;
        lifecycle.advance(RequestState::Completed)?;

        debug!(
            %caller,
            package = validated.package,
            %request_id,
            requested = %validated.context.requested_strengths,
            "authentication dispatched"
        );
        Ok(AuthenticateOutcome::Dispatched { request_id })
    }

    fn fast_fail(&self, reason: &FastFailReason, receiver: Option<&dyn BiometricServiceReceiver>) {
        error!(%reason, "fast-failing authenticate");
        let Some(receiver) = receiver else {
            warn!("no receiver to notify of fast failure");
            return;
        };
        if let Err(err) = receiver.on_error(ModalityBitmask::NONE, ReceiverErrorCode::Canceled, 0) {
            error!(error = %err, "unable to notify receiver of fast failure");
        }
    }

    /// Cancel a session. Missing arguments are logged and ignored.
    pub fn cancel_authentication(
        &self,
        token: Option<ClientToken>,
        package: Option<&str>,
        request_id: RequestId,
    ) -> Result<()> {
        self.gate.enforce_biometric_permission()?;

        let (Some(token), Some(package)) = (token, package) else {
            error!(%request_id, "cancel called with missing token or package");
            return Ok(());
        };

        self.elevated(|authority| authority.cancel_authentication(token, package, request_id))
    }

    /// Whether the requested authenticators can be used right now.
    pub fn can_authenticate(
        &self,
        package: &str,
        user_id: UserId,
        requested: ModalityBitmask,
    ) -> Result<BiometricStatus> {
        let caller = self.gate.caller();
        self.gate.enforce_user_access(caller, user_id)?;

        let status = self.elevated(|authority| {
            authority.can_authenticate(package, user_id, caller.user_id, requested)
        })?;
        debug!(package, user_id, %requested, ?status, "can_authenticate");
        Ok(status)
    }

    /// Resolve a display string for the caller's request.
    ///
    /// Button labels and prompt messages depend on what the authority can
    /// currently satisfy; setting names depend only on what the device
    /// supports.
    pub fn resolve_display_label(
        &self,
        kind: LabelKind,
        user_id: UserId,
        package: &str,
        requested: ModalityBitmask,
    ) -> Result<ResolvedLabel> {
        let caller = self.gate.caller();
        self.gate.enforce_user_access(caller, user_id)?;

        let category = match kind {
            LabelKind::Button | LabelKind::Prompt => {
                let current = self.elevated(|authority| {
                    authority.current_modality(package, user_id, caller.user_id, requested)
                })?;
                resolve_prompt_category(current, requested)
            }
            LabelKind::Setting => {
                let supported =
                    self.elevated(|authority| authority.supported_modalities(requested))?;
                resolve_display_category(supported)
            }
        };

        let text = self.config.labels.label(category, kind);
        debug!(?kind, %requested, %category, "resolved display label");
        Ok(ResolvedLabel { category, text })
    }

    /// Label for the prompt's authenticate button
    pub fn get_button_label(
        &self,
        user_id: UserId,
        package: &str,
        requested: ModalityBitmask,
    ) -> Result<Option<String>> {
        Ok(self
            .resolve_display_label(LabelKind::Button, user_id, package, requested)?
            .text)
    }

    /// Message shown in the prompt body
    pub fn get_prompt_message(
        &self,
        user_id: UserId,
        package: &str,
        requested: ModalityBitmask,
    ) -> Result<Option<String>> {
        Ok(self
            .resolve_display_label(LabelKind::Prompt, user_id, package, requested)?
            .text)
    }

    /// Name of the settings entry
    pub fn get_setting_name(
        &self,
        user_id: UserId,
        package: &str,
        requested: ModalityBitmask,
    ) -> Result<Option<String>> {
        Ok(self
            .resolve_display_label(LabelKind::Setting, user_id, package, requested)?
            .text)
    }

    /// Open a test session. Only the test permission is checked.
    pub fn create_test_session(
        &self,
        sensor_id: i32,
        callback: Arc<dyn TestSessionCallback>,
        package: &str,
    ) -> Result<TestSessionHandle> {
        self.gate.enforce_test()?;
        self.elevated(|authority| authority.create_test_session(sensor_id, callback, package))
    }

    /// Properties of every registered sensor. Test permission required.
    pub fn get_sensor_properties(&self, package: &str) -> Result<Vec<SensorProperties>> {
        self.gate.enforce_test()?;
        self.elevated(|authority| authority.sensor_properties(package))
    }

    /// Package rendering the prompt. Test permission required.
    pub fn get_ui_package(&self) -> Result<String> {
        self.gate.enforce_test()?;
        Ok(self.config.ui_package.clone())
    }

    /// Authenticator ids for `user_id`.
    ///
    /// Same-user callers are not checked: keystore relies on reading its own
    /// user's ids without holding a biometric permission. Other users need the
    /// internal permission.
    pub fn get_authenticator_ids(&self, user_id: UserId) -> Result<Vec<i64>> {
        let caller = self.gate.caller();
        if user_id != caller.user_id {
            self.gate.enforce_internal()?;
        }
        self.elevated(|authority| authority.authenticator_ids(user_id))
    }

    /// Whether `user_id` has anything enrolled. Internal permission required.
    pub fn has_enrolled_biometrics(&self, user_id: UserId, package: &str) -> Result<bool> {
        self.gate.enforce_internal()?;
        self.elevated(|authority| authority.has_enrolled_biometrics(user_id, package))
    }

    /// Register for keyguard enablement changes on the caller's own user.
    pub fn register_enabled_on_keyguard_callback(
        &self,
        callback: Arc<dyn KeyguardCallback>,
    ) -> Result<()> {
        self.gate.enforce_internal()?;
        let calling_user_id = self.gate.caller().user_id;
        self.elevated(|authority| {
            authority.register_enabled_on_keyguard_callback(callback, calling_user_id)
        })
    }

    /// Invalidate authenticator ids. Internal permission required.
    pub fn invalidate_authenticator_ids(
        &self,
        user_id: UserId,
        from_sensor_id: i32,
        callback: Arc<dyn InvalidationCallback>,
    ) -> Result<()> {
        self.gate.enforce_internal()?;
        self.elevated(|authority| {
            authority.invalidate_authenticator_ids(user_id, from_sensor_id, callback)
        })
    }

    /// Reset time-bound lockout. Internal permission required.
    pub fn reset_lockout_time_bound(
        &self,
        token: ClientToken,
        package: &str,
        from_sensor_id: i32,
        user_id: UserId,
        hardware_auth_token: &[u8],
    ) -> Result<()> {
        self.gate.enforce_internal()?;
        self.elevated(|authority| {
            authority.reset_lockout_time_bound(
                token,
                package,
                from_sensor_id,
                user_id,
                hardware_auth_token,
            )
        })
    }

    /// Forward a finger up/down event to the vendor notifier. Internal
    /// permission required.
    pub fn on_finger_state_changed(&self, pressed: bool) -> Result<()> {
        self.gate.enforce_internal()?;
        self.notifier.on_finger_state(pressed);
        Ok(())
    }
}
