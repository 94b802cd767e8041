//! Mock authority, modality backends and receivers
//!
//! Every call into `MockAuthority` is appended to a call log together with
//! whether the service identity was active at the time, so tests can assert
//! both "the authority was never reached" and "it was reached elevated".

use crate::mock_effects::MockPolicyEffects;
use biogate_core::effects::{
    BiometricAuthority, BiometricServiceReceiver, InvalidationCallback, KeyguardCallback,
    ModalityBackend, TestSessionCallback, TestSessionHandle,
};
use biogate_core::{
    BiometricError, BiometricStatus, ClientToken, ModalityBitmask, PromptConfig,
    ReceiverErrorCode, RequestId, Result, SensorDescriptor, SensorModality, SensorProperties,
    UserId,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded call into the authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityCall {
    RegisterAuthenticator(SensorDescriptor),
    CurrentModality {
        package: String,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    },
    SupportedModalities {
        requested: ModalityBitmask,
    },
    CanAuthenticate {
        package: String,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    },
    Authenticate {
        token: ClientToken,
        session_id: i64,
        user_id: UserId,
        package: String,
    },
    CancelAuthentication {
        token: ClientToken,
        package: String,
        request_id: RequestId,
    },
    CreateTestSession {
        sensor_id: i32,
        package: String,
    },
    SensorProperties {
        package: String,
    },
    HasEnrolledBiometrics {
        user_id: UserId,
        package: String,
    },
    RegisterKeyguardCallback {
        calling_user_id: UserId,
    },
    InvalidateAuthenticatorIds {
        user_id: UserId,
        from_sensor_id: i32,
    },
    AuthenticatorIds {
        user_id: UserId,
    },
    ResetLockoutTimeBound {
        package: String,
        from_sensor_id: i32,
        user_id: UserId,
    },
}

/// Recorded call plus the identity state at the time of the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The call
    pub call: AuthorityCall,
    /// Whether the service identity was active, if an observer is attached
    pub elevated: Option<bool>,
}

/// Deterministic, recording authority
#[derive(Debug, Clone)]
pub struct MockAuthority {
    state: Arc<Mutex<AuthorityState>>,
    observer: Option<MockPolicyEffects>,
}

#[derive(Debug)]
struct AuthorityState {
    calls: Vec<RecordedCall>,
    registered: Vec<SensorDescriptor>,
    current_modality: ModalityBitmask,
    supported_modalities: ModalityBitmask,
    status: BiometricStatus,
    enrolled: bool,
    authenticator_ids: Vec<i64>,
    next_request_id: i64,
    failure: Option<BiometricError>,
}

impl Default for MockAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthority {
    /// Authority with nothing available
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AuthorityState {
                calls: Vec::new(),
                registered: Vec::new(),
                current_modality: ModalityBitmask::NONE,
                supported_modalities: ModalityBitmask::NONE,
                status: BiometricStatus::Success,
                enrolled: false,
                authenticator_ids: Vec::new(),
                next_request_id: 1,
                failure: None,
            })),
            observer: None,
        }
    }

    /// Record the elevation state of `policy` on every call
    pub fn observed_by(mut self, policy: &MockPolicyEffects) -> Self {
        self.observer = Some(policy.clone());
        self
    }

    /// Answer for `current_modality`
    pub fn with_current_modality(self, modality: ModalityBitmask) -> Self {
        self.state.lock().current_modality = modality;
        self
    }

    /// Answer for `supported_modalities`
    pub fn with_supported_modalities(self, modality: ModalityBitmask) -> Self {
        self.state.lock().supported_modalities = modality;
        self
    }

    /// Answer for `can_authenticate`
    pub fn with_status(self, status: BiometricStatus) -> Self {
        self.state.lock().status = status;
        self
    }

    /// Answer for `has_enrolled_biometrics`
    pub fn with_enrolled(self, enrolled: bool) -> Self {
        self.state.lock().enrolled = enrolled;
        self
    }

    /// Answer for `authenticator_ids`
    pub fn with_authenticator_ids(self, ids: Vec<i64>) -> Self {
        self.state.lock().authenticator_ids = ids;
        self
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: BiometricError) {
        self.state.lock().failure = Some(error);
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<AuthorityCall> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|recorded| recorded.call.clone())
            .collect()
    }

    /// Every call with its elevation state
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Sensors registered so far
    pub fn registered(&self) -> Vec<SensorDescriptor> {
        self.state.lock().registered.clone()
    }

    fn record(&self, call: AuthorityCall) -> Result<()> {
        let elevated = self.observer.as_ref().map(MockPolicyEffects::is_elevated);
        let mut state = self.state.lock();
        state.calls.push(RecordedCall { call, elevated });
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl BiometricAuthority for MockAuthority {
    fn register_authenticator(&self, descriptor: &SensorDescriptor) -> Result<()> {
        self.record(AuthorityCall::RegisterAuthenticator(*descriptor))?;
        self.state.lock().registered.push(*descriptor);
        Ok(())
    }

    fn current_modality(
        &self,
        package: &str,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    ) -> Result<ModalityBitmask> {
        self.record(AuthorityCall::CurrentModality {
            package: package.to_string(),
            user_id,
            calling_user_id,
            requested,
        })?;
        Ok(self.state.lock().current_modality)
    }

    fn supported_modalities(&self, requested: ModalityBitmask) -> Result<ModalityBitmask> {
        self.record(AuthorityCall::SupportedModalities { requested })?;
        Ok(self.state.lock().supported_modalities)
    }

    fn can_authenticate(
        &self,
        package: &str,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    ) -> Result<BiometricStatus> {
        self.record(AuthorityCall::CanAuthenticate {
            package: package.to_string(),
            user_id,
            calling_user_id,
            requested,
        })?;
        Ok(self.state.lock().status)
    }

    fn authenticate(
        &self,
        token: ClientToken,
        session_id: i64,
        user_id: UserId,
        _receiver: Arc<dyn BiometricServiceReceiver>,
        package: &str,
        _prompt: &PromptConfig,
    ) -> Result<RequestId> {
        self.record(AuthorityCall::Authenticate {
            token,
            session_id,
            user_id,
            package: package.to_string(),
        })?;
        let mut state = self.state.lock();
        let id = state.next_request_id;
        state.next_request_id += 1;
        Ok(RequestId::new(id))
    }

    fn cancel_authentication(
        &self,
        token: ClientToken,
        package: &str,
        request_id: RequestId,
    ) -> Result<()> {
        self.record(AuthorityCall::CancelAuthentication {
            token,
            package: package.to_string(),
            request_id,
        })
    }

    fn create_test_session(
        &self,
        sensor_id: i32,
        _callback: Arc<dyn TestSessionCallback>,
        package: &str,
    ) -> Result<TestSessionHandle> {
        self.record(AuthorityCall::CreateTestSession {
            sensor_id,
            package: package.to_string(),
        })?;
        Ok(TestSessionHandle {
            sensor_id,
            package: package.to_string(),
        })
    }

    fn sensor_properties(&self, package: &str) -> Result<Vec<SensorProperties>> {
        self.record(AuthorityCall::SensorProperties {
            package: package.to_string(),
        })?;
        Ok(Vec::new())
    }

    fn has_enrolled_biometrics(&self, user_id: UserId, package: &str) -> Result<bool> {
        self.record(AuthorityCall::HasEnrolledBiometrics {
            user_id,
            package: package.to_string(),
        })?;
        Ok(self.state.lock().enrolled)
    }

    fn register_enabled_on_keyguard_callback(
        &self,
        _callback: Arc<dyn KeyguardCallback>,
        calling_user_id: UserId,
    ) -> Result<()> {
        self.record(AuthorityCall::RegisterKeyguardCallback { calling_user_id })
    }

    fn invalidate_authenticator_ids(
        &self,
        user_id: UserId,
        from_sensor_id: i32,
        _callback: Arc<dyn InvalidationCallback>,
    ) -> Result<()> {
        self.record(AuthorityCall::InvalidateAuthenticatorIds {
            user_id,
            from_sensor_id,
        })
    }

    fn authenticator_ids(&self, user_id: UserId) -> Result<Vec<i64>> {
        self.record(AuthorityCall::AuthenticatorIds { user_id })?;
        Ok(self.state.lock().authenticator_ids.clone())
    }

    fn reset_lockout_time_bound(
        &self,
        _token: ClientToken,
        package: &str,
        from_sensor_id: i32,
        user_id: UserId,
        _hardware_auth_token: &[u8],
    ) -> Result<()> {
        self.record(AuthorityCall::ResetLockoutTimeBound {
            package: package.to_string(),
            from_sensor_id,
            user_id,
        })
    }
}

/// Recording modality backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    modality: SensorModality,
    state: Arc<Mutex<BackendState>>,
    authority: Option<MockAuthority>,
}

#[derive(Debug, Default)]
struct BackendState {
    registrations: Vec<Vec<SensorProperties>>,
    failure: Option<BiometricError>,
}

impl MockBackend {
    /// Backend serving `modality`
    pub fn new(modality: SensorModality) -> Self {
        Self {
            modality,
            state: Arc::new(Mutex::new(BackendState::default())),
            authority: None,
        }
    }

    /// Register each accepted sensor with `authority`, as a real backend does
    pub fn forwarding_to(mut self, authority: &MockAuthority) -> Self {
        self.authority = Some(authority.clone());
        self
    }

    /// Make registration fail with `error`
    pub fn fail_with(&self, error: BiometricError) {
        self.state.lock().failure = Some(error);
    }

    /// Every batch passed to `register_authenticators`
    pub fn registrations(&self) -> Vec<Vec<SensorProperties>> {
        self.state.lock().registrations.clone()
    }

    /// Sensor ids across every batch
    pub fn registered_ids(&self) -> Vec<i32> {
        self.state
            .lock()
            .registrations
            .iter()
            .flatten()
            .map(SensorProperties::sensor_id)
            .collect()
    }
}

impl ModalityBackend for MockBackend {
    fn modality(&self) -> SensorModality {
        self.modality
    }

    fn register_authenticators(&self, sensors: Vec<SensorProperties>) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.registrations.push(sensors.clone());
            if let Some(error) = &state.failure {
                return Err(error.clone());
            }
        }
        if let Some(authority) = &self.authority {
            for sensor in &sensors {
                authority.register_authenticator(&sensor.descriptor)?;
            }
        }
        Ok(())
    }
}

/// Error delivered to a [`RecordingReceiver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedError {
    /// Modality reported
    pub modality: ModalityBitmask,
    /// Error code
    pub error: ReceiverErrorCode,
    /// Vendor code
    pub vendor_code: i32,
}

/// Receiver that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingReceiver {
    state: Arc<Mutex<ReceiverState>>,
}

#[derive(Debug, Default)]
struct ReceiverState {
    errors: Vec<ReceivedError>,
    unreachable: bool,
}

impl RecordingReceiver {
    /// Receiver that accepts notifications
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver whose process has died: notifications fail after being recorded
    pub fn unreachable() -> Self {
        let receiver = Self::default();
        receiver.state.lock().unreachable = true;
        receiver
    }

    /// Errors received so far
    pub fn errors(&self) -> Vec<ReceivedError> {
        self.state.lock().errors.clone()
    }
}

impl BiometricServiceReceiver for RecordingReceiver {
    fn on_error(
        &self,
        modality: ModalityBitmask,
        error: ReceiverErrorCode,
        vendor_code: i32,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.errors.push(ReceivedError {
            modality,
            error,
            vendor_code,
        });
        if state.unreachable {
            return Err(BiometricError::transport("receiver died"));
        }
        Ok(())
    }
}

/// Callback that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallback;

impl TestSessionCallback for NoopCallback {
    fn on_cleanup_finished(&self, _user_id: UserId) {}
}

impl KeyguardCallback for NoopCallback {
    fn on_changed(&self, _enabled: bool, _user_id: UserId) {}
}

impl InvalidationCallback for NoopCallback {
    fn on_completed(&self) {}
}
