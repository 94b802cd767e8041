//! Sensor descriptors and the per-modality properties forwarded to backends

use crate::modality::{SensorModality, SensorStrength};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed description of one physical or logical sensor.
///
/// Ids are unique within a modality; the registry keys on `(modality, id)`.
/// Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorDescriptor {
    id: i32,
    modality: SensorModality,
    strength: SensorStrength,
}

impl SensorDescriptor {
    /// Create a new descriptor
    pub fn new(id: i32, modality: SensorModality, strength: SensorStrength) -> Self {
        Self {
            id,
            modality,
            strength,
        }
    }

    /// Sensor id, unique within its modality
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Sensing family
    pub fn modality(&self) -> SensorModality {
        self.modality
    }

    /// Declared strength tier
    pub fn strength(&self) -> SensorStrength {
        self.strength
    }

    /// Global registry key
    pub fn registry_key(&self) -> (SensorModality, i32) {
        (self.modality, self.id)
    }
}

impl fmt::Display for SensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({})", self.modality, self.id, self.strength)
    }
}

/// Physical placement of a fingerprint sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintSensorKind {
    /// Rear-mounted capacitive sensor
    Rear,
    /// Sensor integrated into the power button
    PowerButton,
    /// Optical sensor under the display
    UnderDisplayOptical,
    /// Ultrasonic sensor under the display
    UnderDisplayUltrasonic,
}

impl FingerprintSensorKind {
    /// Returns `true` if the sensor sits under the display.
    pub fn is_under_display(self) -> bool {
        matches!(
            self,
            Self::UnderDisplayOptical | Self::UnderDisplayUltrasonic
        )
    }
}

/// Centre and radius of an under-display sensor, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorLocation {
    /// Horizontal centre
    pub x: i32,
    /// Vertical centre
    pub y: i32,
    /// Touch radius
    pub radius: i32,
}

/// Modality-specific details attached when a descriptor is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorDetails {
    /// Fingerprint details
    Fingerprint {
        /// Sensor placement
        kind: FingerprintSensorKind,
        /// Location for under-display sensors
        location: Option<SensorLocation>,
        /// Whether resetting lockout needs a hardware auth token
        reset_lockout_requires_hardware_auth_token: bool,
    },
    /// Face details
    Face {
        /// Whether the sensor can light the face itself
        supports_self_illumination: bool,
        /// Whether face detection without authentication is supported
        supports_face_detect: bool,
        /// Whether resetting lockout needs a challenge
        reset_lockout_requires_challenge: bool,
    },
    /// Iris details
    Iris,
}

/// Everything a modality backend needs to register one sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorProperties {
    /// Descriptor as parsed from configuration
    pub descriptor: SensorDescriptor,
    /// Maximum enrollments per user
    pub max_enrollments_per_user: u32,
    /// Modality-specific details
    pub details: SensorDetails,
}

impl SensorProperties {
    /// Sensor id
    pub fn sensor_id(&self) -> i32 {
        self.descriptor.id()
    }

    /// Sensor modality
    pub fn modality(&self) -> SensorModality {
        self.descriptor.modality()
    }
}
