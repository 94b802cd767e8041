//! Collaborator interfaces
//!
//! Every external dependency of the service is expressed as a trait here and
//! injected through constructors. Production handlers live in
//! `biogate-effects`; deterministic mocks live in `biogate-testkit`.

pub mod authority;
pub mod notifier;
pub mod policy;

pub use authority::{
    BiometricAuthority, BiometricServiceReceiver, InvalidationCallback, KeyguardCallback,
    ModalityBackend, TestSessionCallback, TestSessionHandle,
};
pub use notifier::{EnvironmentProbe, SensorNotifier, VendorCommand, VendorCommandSink};
pub use policy::{
    AppOpMode, AppOpsEffects, IdentityEffects, IdentityToken, Permission, PermissionEffects,
    PolicyEffects, ProcessStateEffects,
};
