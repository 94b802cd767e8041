//! # Biogate Service - Layer 4: Orchestration
//!
//! The caller-facing biometric authentication service.
//!
//! - [`parser`] turns configuration strings into sensor descriptors
//! - [`adapters`] forward descriptors to per-modality backends
//! - [`gate`] runs the ordered permission and policy checks
//! - [`router`] dispatches requests to the authority under the service identity
//!
//! # Usage
//!
//! ```ignore
//! use biogate_service::{AuthService, ProviderSet, ServiceConfig};
//!
//! let config = ServiceConfig::load(path)?;
//! let service = AuthService::new(effects, authority, config).with_notifier(notifier);
//! let report = service.on_start(&providers);
//! ```

pub mod adapters;
pub mod config;
pub mod gate;
pub mod identity;
pub mod lifecycle;
pub mod parser;
pub mod router;
pub mod startup;

pub use adapters::{AdapterOutcome, ModalityProviderAdapter, ProviderSet, SensorPropertiesFactory};
pub use config::{FaceConfig, FingerprintConfig, ServiceConfig};
pub use gate::{
    AuthenticateRequest, FastFailReason, GateOutcome, PermissionGate, ValidatedAuthenticate,
};
pub use identity::{with_service_identity, ServiceIdentityScope};
pub use lifecycle::{RequestLifecycle, RequestState};
pub use parser::{parse_sensor_configs, parse_sensor_entry, ParsedSensors, RejectedEntry};
pub use router::{AuthService, AuthenticateOutcome, ResolvedLabel};
pub use startup::{register_authenticators, RegistrationReport};
