//! Modality provider adapters
//!
//! One adapter per biometric modality. Each adapter filters the parsed
//! descriptors down to its modality, attaches modality-specific properties and
//! forwards them to that modality's backend. A missing or unreachable backend
//! never fails startup; it is logged and the modality is treated as absent.

use crate::config::{FaceConfig, FingerprintConfig, ServiceConfig};
use biogate_core::effects::ModalityBackend;
use biogate_core::{
    BiometricError, FingerprintSensorKind, SensorDescriptor, SensorDetails, SensorModality,
    SensorProperties,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Builds [`SensorProperties`] for descriptors from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorPropertiesFactory {
    fingerprint: FingerprintConfig,
    face: FaceConfig,
}

impl SensorPropertiesFactory {
    /// Factory using the sensor sections of `config`
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            fingerprint: config.fingerprint.clone(),
            face: config.face.clone(),
        }
    }

    /// Fingerprint placement implied by configuration
    pub fn fingerprint_kind(&self) -> FingerprintSensorKind {
        match (&self.fingerprint.under_display, self.fingerprint.ultrasonic) {
            (Some(_), true) => FingerprintSensorKind::UnderDisplayUltrasonic,
            (Some(_), false) => FingerprintSensorKind::UnderDisplayOptical,
            (None, _) if self.fingerprint.power_button => FingerprintSensorKind::PowerButton,
            (None, _) => FingerprintSensorKind::Rear,
        }
    }

    /// Properties for one descriptor; `None` for [`SensorModality::None`].
    pub fn properties_for(&self, descriptor: SensorDescriptor) -> Option<SensorProperties> {
        let (max_enrollments_per_user, details) = match descriptor.modality() {
            SensorModality::Fingerprint => (
                self.fingerprint.max_enrollments_per_user,
                SensorDetails::Fingerprint {
                    kind: self.fingerprint_kind(),
                    location: self.fingerprint.under_display,
                    reset_lockout_requires_hardware_auth_token: false,
                },
            ),
            SensorModality::Face => (
                self.face.max_enrollments_per_user,
                SensorDetails::Face {
                    supports_self_illumination: self.face.supports_self_illumination,
                    supports_face_detect: false,
                    reset_lockout_requires_challenge: true,
                },
            ),
            SensorModality::Iris => (1, SensorDetails::Iris),
            SensorModality::None => return None,
        };
        Some(SensorProperties {
            descriptor,
            max_enrollments_per_user,
            details,
        })
    }
}

/// What happened when an adapter ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterOutcome {
    /// Backend accepted `count` sensors (possibly zero)
    Registered {
        /// Sensors forwarded
        count: usize,
    },
    /// No backend on this device
    BackendAbsent {
        /// Sensors configured for the missing backend
        expected: usize,
    },
    /// Backend could not be reached; modality treated as absent
    BackendFailed {
        /// Sensors that were not registered
        count: usize,
        /// Error returned by the backend
        error: BiometricError,
    },
}

impl AdapterOutcome {
    /// Returns `true` if the backend accepted the registration.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

impl fmt::Display for AdapterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered { count } => write!(f, "registered {count} sensor(s)"),
            Self::BackendAbsent { expected: 0 } => f.write_str("backend absent"),
            Self::BackendAbsent { expected } => {
                write!(f, "backend absent, {expected} configured sensor(s) dropped")
            }
            Self::BackendFailed { count, error } => {
                write!(f, "backend failed ({error}), {count} sensor(s) dropped")
            }
        }
    }
}

/// Adapter forwarding one modality's sensors to its backend
#[derive(Clone)]
pub struct ModalityProviderAdapter {
    modality: SensorModality,
    backend: Option<Arc<dyn ModalityBackend>>,
    properties: SensorPropertiesFactory,
}

impl fmt::Debug for ModalityProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalityProviderAdapter")
            .field("modality", &self.modality)
            .field("backend_present", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

impl ModalityProviderAdapter {
    /// Create an adapter; `backend` is `None` when the service is not running.
    pub fn new(
        modality: SensorModality,
        backend: Option<Arc<dyn ModalityBackend>>,
        properties: SensorPropertiesFactory,
    ) -> Self {
        Self {
            modality,
            backend,
            properties,
        }
    }

    /// Modality served by this adapter
    pub fn modality(&self) -> SensorModality {
        self.modality
    }

    /// Forward the descriptors of this adapter's modality to the backend.
    ///
    /// Descriptors of other modalities are ignored. The backend is called even
    /// when nothing was configured for it.
    pub fn register(&self, descriptors: &[SensorDescriptor]) -> AdapterOutcome {
        let sensors: Vec<SensorProperties> = descriptors
            .iter()
            .filter(|descriptor| descriptor.modality() == self.modality)
            .filter_map(|descriptor| self.properties.properties_for(*descriptor))
            .collect();
        let count = sensors.len();

        let Some(backend) = &self.backend else {
            if count > 0 {
                error!(
                    modality = %self.modality,
                    expected = count,
                    "configuration inconsistency: sensors configured but backend missing"
                );
            } else {
                debug!(modality = %self.modality, "backend absent");
            }
            return AdapterOutcome::BackendAbsent { expected: count };
        };

        if backend.modality() != self.modality {
            warn!(
                adapter = %self.modality,
                backend = %backend.modality(),
                "backend reports a different modality than its adapter"
            );
        }

        match backend.register_authenticators(sensors) {
            Ok(()) => {
                info!(modality = %self.modality, count, "registered sensors with backend");
                AdapterOutcome::Registered { count }
            }
            Err(error) => {
                error!(
                    modality = %self.modality,
                    count,
                    error = %error,
                    "backend registration failed, treating modality as absent"
                );
                AdapterOutcome::BackendFailed { count, error }
            }
        }
    }
}

/// Backends available on this device, keyed by modality
#[derive(Clone, Default)]
pub struct ProviderSet {
    fingerprint: Option<Arc<dyn ModalityBackend>>,
    face: Option<Arc<dyn ModalityBackend>>,
    iris: Option<Arc<dyn ModalityBackend>>,
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("fingerprint", &self.fingerprint.is_some())
            .field("face", &self.face.is_some())
            .field("iris", &self.iris.is_some())
            .finish()
    }
}

impl ProviderSet {
    /// No backends
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend under the modality it reports.
    ///
    /// A backend reporting [`SensorModality::None`] is ignored.
    pub fn with_backend(mut self, backend: Arc<dyn ModalityBackend>) -> Self {
        match backend.modality() {
            SensorModality::Fingerprint => self.fingerprint = Some(backend),
            SensorModality::Face => self.face = Some(backend),
            SensorModality::Iris => self.iris = Some(backend),
            SensorModality::None => warn!("ignoring backend without a modality"),
        }
        self
    }

    /// Backend for `modality`, if present
    pub fn backend(&self, modality: SensorModality) -> Option<Arc<dyn ModalityBackend>> {
        match modality {
            SensorModality::Fingerprint => self.fingerprint.clone(),
            SensorModality::Face => self.face.clone(),
            SensorModality::Iris => self.iris.clone(),
            SensorModality::None => None,
        }
    }

    /// One adapter per biometric modality, in registration order
    pub fn adapters(&self, properties: &SensorPropertiesFactory) -> Vec<ModalityProviderAdapter> {
        SensorModality::BIOMETRIC
            .iter()
            .map(|modality| {
                ModalityProviderAdapter::new(*modality, self.backend(*modality), properties.clone())
            })
            .collect()
    }
}
