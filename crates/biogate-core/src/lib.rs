//! # Biogate Core - Layer 1: Foundation
//!
//! Sensor data model, the unified error type, the modality resolver and the
//! interfaces of every external collaborator (authority, modality backends,
//! policy queries, vendor notifiers).
//!
//! Nothing in this crate performs I/O. The resolver functions in [`display`]
//! are pure and total.

pub mod display;
pub mod effects;
pub mod errors;
pub mod modality;
pub mod request;
pub mod sensor;

pub use display::{
    credential_backup_modality, resolve_display_category, resolve_prompt_category,
    CredentialPairing, DisplayCategory, LabelKind, LabelSet, LabelTable,
};
pub use errors::{BiometricError, Result};
pub use modality::{ModalityBitmask, SensorModality, SensorStrength};
pub use request::{
    BiometricStatus, CallerIdentity, ClientToken, PromptConfig, ReceiverErrorCode,
    RequestContext, RequestId, UserId,
};
pub use sensor::{
    FingerprintSensorKind, SensorDescriptor, SensorDetails, SensorLocation, SensorProperties,
};
