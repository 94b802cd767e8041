//! Sensor descriptor parser
//!
//! Turns raw `<id>:<modality>:<strength>` configuration strings into typed
//! [`SensorDescriptor`]s. A bad entry is skipped and logged; the entries that
//! did parse are still returned in input order.

use biogate_core::{BiometricError, Result, SensorDescriptor, SensorModality, SensorStrength};
use tracing::{debug, error};

/// Entry that could not be turned into a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the input
    pub index: usize,
    /// Raw configuration string
    pub raw: String,
    /// Why it was skipped
    pub reason: BiometricError,
}

/// Result of parsing a batch of configuration strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSensors {
    /// Descriptors in input order
    pub descriptors: Vec<SensorDescriptor>,
    /// Skipped entries in input order
    pub rejected: Vec<RejectedEntry>,
}

impl ParsedSensors {
    /// Descriptors of one modality, in input order
    pub fn of_modality(&self, modality: SensorModality) -> Vec<SensorDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.modality() == modality)
            .copied()
            .collect()
    }
}

/// Parse every entry, skipping the ones that fail.
///
/// `None` means this transport family has no sensors and yields an empty
/// result.
pub fn parse_sensor_configs<S: AsRef<str>>(entries: Option<&[S]>) -> ParsedSensors {
    let mut parsed = ParsedSensors::default();
    let Some(entries) = entries else {
        debug!("no sensor configuration present");
        return parsed;
    };

    for (index, entry) in entries.iter().enumerate() {
        let raw = entry.as_ref();
        match parse_sensor_entry(raw) {
            Ok(descriptor) => {
                debug!(index, %descriptor, "parsed sensor");
                parsed.descriptors.push(descriptor);
            }
            Err(reason) => {
                error!(index, raw, error = %reason, "skipping sensor configuration entry");
                parsed.rejected.push(RejectedEntry {
                    index,
                    raw: raw.to_string(),
                    reason,
                });
            }
        }
    }
    parsed
}

/// Parse a single `<id>:<modality>:<strength>` entry.
pub fn parse_sensor_entry(raw: &str) -> Result<SensorDescriptor> {
    let fields: Vec<&str> = raw.split([':', ',']).map(str::trim).collect();
    let [id, modality, strength] = fields.as_slice() else {
        return Err(BiometricError::invalid(format!(
            "expected 3 fields in sensor entry {raw:?}, found {}",
            fields.len()
        )));
    };

    let id = i32::try_from(parse_number(id, "id")?)
        .map_err(|_| BiometricError::invalid(format!("sensor id out of range: {id}")))?;

    let modality_code = parse_number(modality, "modality")?;
    let modality = SensorModality::from_code(modality_code).ok_or_else(|| {
        BiometricError::configuration_inconsistency(format!(
            "unknown modality code {modality_code:#x} for sensor {id}"
        ))
    })?;

    let strength_code = parse_number(strength, "strength")?;
    let strength = SensorStrength::from_code(strength_code).ok_or_else(|| {
        BiometricError::invalid(format!(
            "unknown strength code {strength_code:#x} for sensor {id}"
        ))
    })?;

    Ok(SensorDescriptor::new(id, modality, strength))
}

fn parse_number(field: &str, name: &str) -> Result<u32> {
    let parsed = match field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => field.parse(),
    };
    parsed.map_err(|_| BiometricError::invalid(format!("invalid {name} field: {field:?}")))
}
