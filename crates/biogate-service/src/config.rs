//! Service configuration
//!
//! Read once at process start. Every field has a default, so an empty file is
//! a valid configuration describing a device with no legacy-transport sensors.
//!
//! ```toml
//! sensors = ["0:2:15", "1:8:255"]
//! ui_package = "com.example.prompt"
//!
//! [fingerprint]
//! under_display = { x = 540, y = 1636, radius = 95 }
//!
//! [labels.fingerprint]
//! button_label = "Touch the sensor"
//! ```

use biogate_core::{BiometricError, LabelTable, Result, SensorLocation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default prompt UI package
pub const DEFAULT_UI_PACKAGE: &str = "com.android.systemui";

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Raw `<id>:<modality>:<strength>` strings for legacy-transport sensors
    pub sensors: Option<Vec<String>>,
    /// Ignore `sensors` entirely
    pub legacy_transport_disabled: bool,
    /// Package that renders the prompt
    pub ui_package: String,
    /// Fingerprint sensor details
    pub fingerprint: FingerprintConfig,
    /// Face sensor details
    pub face: FaceConfig,
    /// Display strings
    pub labels: LabelTable,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sensors: None,
            legacy_transport_disabled: false,
            ui_package: DEFAULT_UI_PACKAGE.to_string(),
            fingerprint: FingerprintConfig::default(),
            face: FaceConfig::default(),
            labels: LabelTable::default(),
        }
    }
}

/// Fingerprint sensor details shared by every configured fingerprint sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FingerprintConfig {
    /// Sensor is built into the power button
    pub power_button: bool,
    /// Location of an under-display sensor
    pub under_display: Option<SensorLocation>,
    /// Under-display sensor is ultrasonic rather than optical
    pub ultrasonic: bool,
    /// Maximum templates per user
    pub max_enrollments_per_user: u32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            power_button: false,
            under_display: None,
            ultrasonic: false,
            max_enrollments_per_user: 5,
        }
    }
}

/// Face sensor details shared by every configured face sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaceConfig {
    /// Sensor can illuminate the face itself
    pub supports_self_illumination: bool,
    /// Maximum templates per user
    pub max_enrollments_per_user: u32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            supports_self_illumination: false,
            max_enrollments_per_user: 1,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| BiometricError::invalid(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(
            path = %path.display(),
            sensors = config.sensors.as_ref().map_or(0, Vec::len),
            "loaded service config"
        );
        Ok(config)
    }

    /// Check field-level constraints
    pub fn validate(&self) -> Result<()> {
        if self.ui_package.trim().is_empty() {
            return Err(BiometricError::invalid("ui_package must not be empty"));
        }
        if self.fingerprint.max_enrollments_per_user == 0 {
            return Err(BiometricError::invalid(
                "fingerprint.max_enrollments_per_user must be at least 1",
            ));
        }
        if self.face.max_enrollments_per_user == 0 {
            return Err(BiometricError::invalid(
                "face.max_enrollments_per_user must be at least 1",
            ));
        }
        if let Some(location) = &self.fingerprint.under_display {
            if location.radius <= 0 {
                return Err(BiometricError::invalid(
                    "fingerprint.under_display.radius must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Legacy sensor strings, or `None` when absent or disabled
    pub fn legacy_sensor_strings(&self) -> Option<&[String]> {
        if self.legacy_transport_disabled {
            return None;
        }
        self.sensors.as_deref()
    }
}
