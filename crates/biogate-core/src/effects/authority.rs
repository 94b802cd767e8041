//! Authority and modality backend interfaces
//!
//! # Effect Classification
//!
//! - **Category**: Remote collaborator
//! - **Implementation**: supplied by the host platform; recording mocks in `biogate-testkit`
//! - **Usage**: called by the request router under the service's own identity
//!
//! Every method is a remote, fallible call. A `BiometricError::Transport` returned
//! here is propagated to the caller unchanged at request time, and treated as
//! "feature absent" at registration time.
//!
//! The traits are synchronous. The router wraps each call in a
//! privilege-elevation scope, which must never span a suspension point.

use crate::errors::Result;
use crate::modality::{ModalityBitmask, SensorModality};
use crate::request::{
    BiometricStatus, ClientToken, PromptConfig, ReceiverErrorCode, RequestId, UserId,
};
use crate::sensor::{SensorDescriptor, SensorProperties};
use std::sync::Arc;

/// Receiver of asynchronous results for one `authenticate` call.
pub trait BiometricServiceReceiver: Send + Sync {
    /// Deliver an error. May itself fail if the receiver has gone away.
    fn on_error(
        &self,
        modality: ModalityBitmask,
        error: ReceiverErrorCode,
        vendor_code: i32,
    ) -> Result<()>;
}

/// Callback for a test session created by `create_test_session`.
pub trait TestSessionCallback: Send + Sync {
    /// Called once the session's cleanup has finished for `user_id`.
    fn on_cleanup_finished(&self, user_id: UserId);
}

/// Callback notified when biometric unlock on the keyguard is toggled.
pub trait KeyguardCallback: Send + Sync {
    /// Biometric unlock became enabled or disabled for `user_id`.
    fn on_changed(&self, enabled: bool, user_id: UserId);
}

/// Callback notified when authenticator ids have been invalidated.
pub trait InvalidationCallback: Send + Sync {
    /// Invalidation finished.
    fn on_completed(&self);
}

/// Handle to a test session opened against one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSessionHandle {
    /// Sensor the session drives
    pub sensor_id: i32,
    /// Package that opened the session
    pub package: String,
}

/// Downstream authority owning the merged view of every registered sensor.
///
/// Implementations provide their own concurrency safety; the router adds no
/// locking and assumes no ordering between concurrent callers.
pub trait BiometricAuthority: Send + Sync {
    /// Register one sensor.
    ///
    /// Called by the [`ModalityBackend`] implementations while they handle
    /// `register_authenticators`; the router never calls it directly.
    fn register_authenticator(&self, descriptor: &SensorDescriptor) -> Result<()>;

    /// Modalities currently satisfiable for this caller and request.
    fn current_modality(
        &self,
        package: &str,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    ) -> Result<ModalityBitmask>;

    /// Modalities the device supports for the requested strengths, ignoring enrollment.
    fn supported_modalities(&self, requested: ModalityBitmask) -> Result<ModalityBitmask>;

    /// Whether the requested authenticators can be used right now.
    fn can_authenticate(
        &self,
        package: &str,
        user_id: UserId,
        calling_user_id: UserId,
        requested: ModalityBitmask,
    ) -> Result<BiometricStatus>;

    /// Start an authentication session.
    fn authenticate(
        &self,
        token: ClientToken,
        session_id: i64,
        user_id: UserId,
        receiver: Arc<dyn BiometricServiceReceiver>,
        package: &str,
        prompt: &PromptConfig,
    ) -> Result<RequestId>;

    /// Cancel a previously started session.
    fn cancel_authentication(
        &self,
        token: ClientToken,
        package: &str,
        request_id: RequestId,
    ) -> Result<()>;

    /// Open a test session against one sensor.
    fn create_test_session(
        &self,
        sensor_id: i32,
        callback: Arc<dyn TestSessionCallback>,
        package: &str,
    ) -> Result<TestSessionHandle>;

    /// Properties of every registered sensor.
    fn sensor_properties(&self, package: &str) -> Result<Vec<SensorProperties>>;

    /// Whether `user_id` has anything enrolled.
    fn has_enrolled_biometrics(&self, user_id: UserId, package: &str) -> Result<bool>;

    /// Register for keyguard enablement changes.
    fn register_enabled_on_keyguard_callback(
        &self,
        callback: Arc<dyn KeyguardCallback>,
        calling_user_id: UserId,
    ) -> Result<()>;

    /// Invalidate authenticator ids, starting from `from_sensor_id`.
    fn invalidate_authenticator_ids(
        &self,
        user_id: UserId,
        from_sensor_id: i32,
        callback: Arc<dyn InvalidationCallback>,
    ) -> Result<()>;

    /// Current authenticator ids for `user_id`.
    fn authenticator_ids(&self, user_id: UserId) -> Result<Vec<i64>>;

    /// Reset time-bound lockout using a hardware auth token.
    fn reset_lockout_time_bound(
        &self,
        token: ClientToken,
        package: &str,
        from_sensor_id: i32,
        user_id: UserId,
        hardware_auth_token: &[u8],
    ) -> Result<()>;
}

/// Modality-specific provider service (fingerprint, face or iris).
///
/// A backend that is not running is represented by its absence
/// (`Option::None`), which is a valid, non-fatal state.
pub trait ModalityBackend: Send + Sync {
    /// Modality this backend serves
    fn modality(&self) -> SensorModality;

    /// Register the sensors configured for this modality.
    ///
    /// Called even with an empty list: backends with self-describing hardware
    /// register those sensors from here.
    fn register_authenticators(&self, sensors: Vec<SensorProperties>) -> Result<()>;
}
