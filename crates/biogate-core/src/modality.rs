//! Modalities, strengths and the modality bitmask
//!
//! Bit values follow the platform's authenticator type constants so that
//! masks produced by the authority can be passed through unchanged.

use crate::errors::{BiometricError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Bit-set over {Credential, Fingerprint, Iris, Face}.
///
/// Used both for the strengths a caller requests and for the modalities the
/// authority reports as currently satisfiable. Only the four defined bits are
/// ever set; `NOT` is masked to the defined bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModalityBitmask(u32);

impl ModalityBitmask {
    /// No modality
    pub const NONE: Self = Self(0);
    /// Device credential (PIN, pattern, password)
    pub const CREDENTIAL: Self = Self(1 << 0);
    /// Fingerprint
    pub const FINGERPRINT: Self = Self(1 << 1);
    /// Iris
    pub const IRIS: Self = Self(1 << 2);
    /// Face
    pub const FACE: Self = Self(1 << 3);

    const ALL_BITS: u32 = 0b1111;
    const BIOMETRIC_BITS: u32 = 0b1110;

    /// Build a mask from raw bits, dropping undefined bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// Build a mask from raw bits, rejecting undefined bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::ALL_BITS != 0 {
            return Err(BiometricError::invalid(format!(
                "modality bitmask {bits:#x} has undefined bits set"
            )));
        }
        Ok(Self(bits))
    }

    /// Raw bit value
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Iterate every representable mask value (all sixteen of them).
    pub fn all_values() -> impl Iterator<Item = Self> {
        (0..=Self::ALL_BITS).map(Self)
    }

    /// Returns `true` if no bit is set.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the credential bit is set.
    pub const fn has_credential(self) -> bool {
        self.contains(Self::CREDENTIAL)
    }

    /// The mask with the credential bit cleared.
    pub const fn biometrics(self) -> Self {
        Self(self.0 & Self::BIOMETRIC_BITS)
    }

    /// Number of biometric bits set.
    pub const fn biometric_count(self) -> u32 {
        (self.0 & Self::BIOMETRIC_BITS).count_ones()
    }
}

impl BitOr for ModalityBitmask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModalityBitmask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ModalityBitmask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ModalityBitmask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ModalityBitmask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL_BITS)
    }
}

impl From<SensorModality> for ModalityBitmask {
    fn from(modality: SensorModality) -> Self {
        match modality {
            SensorModality::None => Self::NONE,
            SensorModality::Fingerprint => Self::FINGERPRINT,
            SensorModality::Iris => Self::IRIS,
            SensorModality::Face => Self::FACE,
        }
    }
}

impl fmt::Display for ModalityBitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let names = [
            (Self::CREDENTIAL, "credential"),
            (Self::FINGERPRINT, "fingerprint"),
            (Self::IRIS, "iris"),
            (Self::FACE, "face"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Sensing family of a physical or logical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorModality {
    /// No modality
    None,
    /// Fingerprint sensor
    Fingerprint,
    /// Iris sensor
    Iris,
    /// Face sensor
    Face,
}

impl SensorModality {
    /// Biometric modalities that have a provider backend.
    pub const BIOMETRIC: [SensorModality; 3] = [
        SensorModality::Fingerprint,
        SensorModality::Face,
        SensorModality::Iris,
    ];

    /// Decode a configuration modality code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            2 => Some(Self::Fingerprint),
            4 => Some(Self::Iris),
            8 => Some(Self::Face),
            _ => None,
        }
    }

    /// Configuration code for this modality
    pub fn code(self) -> u32 {
        ModalityBitmask::from(self).bits()
    }

    /// Lower-case name used in logs and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fingerprint => "fingerprint",
            Self::Iris => "iris",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for SensorModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared assurance tier of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorStrength {
    /// Convenience tier (not usable for keystore-bound operations)
    Convenience,
    /// Weak tier
    Weak,
    /// Strong tier
    Strong,
}

impl SensorStrength {
    /// Decode a platform authenticator strength constant.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x000F => Some(Self::Strong),
            0x00FF => Some(Self::Weak),
            0x0FFF => Some(Self::Convenience),
            _ => None,
        }
    }

    /// Platform authenticator constant for this strength
    pub fn code(self) -> u32 {
        match self {
            Self::Strong => 0x000F,
            Self::Weak => 0x00FF,
            Self::Convenience => 0x0FFF,
        }
    }

    /// Lower-case name used in logs and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Convenience => "convenience",
            Self::Weak => "weak",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for SensorStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
