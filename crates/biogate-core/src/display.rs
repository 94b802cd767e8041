//! Modality resolution for user-facing strings
//!
//! Two distinct pure functions live here and must not be merged:
//!
//! - [`resolve_display_category`] answers "which label describes this set of
//!   modalities" (label time). It is total over every bitmask value.
//! - [`credential_backup_modality`] answers "which modality actually satisfied
//!   this attempt" (authentication time). It is only called with at most one
//!   biometric bit set.
//!
//! [`LabelTable`] maps the resulting category onto configurable strings.

use crate::modality::ModalityBitmask;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Biometric paired with the device credential in a combined label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialPairing {
    /// Credential or fingerprint
    Fingerprint,
    /// Credential or face
    Face,
    /// Credential or any other single biometric
    OtherBiometric,
}

/// Closed set of label categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayCategory {
    /// Nothing qualifies; callers fall back to a neutral label
    NoModality,
    /// Fingerprint alone
    Fingerprint,
    /// Face alone
    Face,
    /// Iris alone
    Iris,
    /// Device credential alone
    CredentialOnly,
    /// Device credential together with exactly one biometric
    CredentialOr(CredentialPairing),
    /// Two or more biometrics, with or without the credential
    GenericBiometric,
}

impl DisplayCategory {
    /// Every category, in table order
    pub const ALL: [DisplayCategory; 9] = [
        DisplayCategory::NoModality,
        DisplayCategory::Fingerprint,
        DisplayCategory::Face,
        DisplayCategory::Iris,
        DisplayCategory::CredentialOnly,
        DisplayCategory::CredentialOr(CredentialPairing::Fingerprint),
        DisplayCategory::CredentialOr(CredentialPairing::Face),
        DisplayCategory::CredentialOr(CredentialPairing::OtherBiometric),
        DisplayCategory::GenericBiometric,
    ];

    /// Stable name used in logs and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoModality => "no-modality",
            Self::Fingerprint => "fingerprint",
            Self::Face => "face",
            Self::Iris => "iris",
            Self::CredentialOnly => "credential-only",
            Self::CredentialOr(CredentialPairing::Fingerprint) => "credential-or-fingerprint",
            Self::CredentialOr(CredentialPairing::Face) => "credential-or-face",
            Self::CredentialOr(CredentialPairing::OtherBiometric) => {
                "credential-or-other-biometric"
            }
            Self::GenericBiometric => "generic-biometric",
        }
    }
}

impl fmt::Display for DisplayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label-time resolution of a modality mask.
pub fn resolve_display_category(mask: ModalityBitmask) -> DisplayCategory {
    let biometrics = mask.biometrics();
    match (mask.has_credential(), mask.biometric_count()) {
        (false, 0) => DisplayCategory::NoModality,
        (true, 0) => DisplayCategory::CredentialOnly,
        (false, 1) => {
            if biometrics == ModalityBitmask::FINGERPRINT {
                DisplayCategory::Fingerprint
            } else if biometrics == ModalityBitmask::FACE {
                DisplayCategory::Face
            } else {
                DisplayCategory::Iris
            }
        }
        (true, 1) => {
            let pairing = if biometrics == ModalityBitmask::FINGERPRINT {
                CredentialPairing::Fingerprint
            } else if biometrics == ModalityBitmask::FACE {
                CredentialPairing::Face
            } else {
                CredentialPairing::OtherBiometric
            };
            DisplayCategory::CredentialOr(pairing)
        }
        _ => DisplayCategory::GenericBiometric,
    }
}

/// Authentication-time resolution: the modality that satisfied an attempt.
///
/// Credential stays credential; otherwise the credential bit is masked off and
/// whatever biometric remains is returned.
pub fn credential_backup_modality(modality: ModalityBitmask) -> ModalityBitmask {
    if modality == ModalityBitmask::CREDENTIAL {
        modality
    } else {
        modality & !ModalityBitmask::CREDENTIAL
    }
}

/// Category for prompt-side strings (button label, prompt message).
///
/// `current` is what the authority reports for this caller; `requested` is
/// what the caller asked for. The backup modality is resolved first, then the
/// credential bit is added back when the caller accepts the credential, so a
/// fingerprint-or-PIN request reads "fingerprint or screen lock".
pub fn resolve_prompt_category(
    current: ModalityBitmask,
    requested: ModalityBitmask,
) -> DisplayCategory {
    let backup = credential_backup_modality(current);
    if requested.has_credential() && backup.biometric_count() > 0 {
        resolve_display_category(backup | ModalityBitmask::CREDENTIAL)
    } else {
        resolve_display_category(backup)
    }
}

/// Strings shown for one category. `None` means "use a neutral label".
///
/// When read as part of a [`LabelTable`], a missing field keeps the built-in
/// string rather than clearing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelSet {
    /// Label of the button that opens the prompt
    pub button_label: Option<String>,
    /// Prompt subtitle
    pub prompt_message: Option<String>,
    /// Name of the settings entry
    pub setting_name: Option<String>,
}

impl LabelSet {
    fn new(button_label: &str, prompt_message: &str, setting_name: &str) -> Self {
        Self {
            button_label: Some(button_label.to_string()),
            prompt_message: Some(prompt_message.to_string()),
            setting_name: Some(setting_name.to_string()),
        }
    }

    /// Fields set in `overrides` replace ours; the rest are kept.
    fn merged(self, overrides: LabelSet) -> Self {
        Self {
            button_label: overrides.button_label.or(self.button_label),
            prompt_message: overrides.prompt_message.or(self.prompt_message),
            setting_name: overrides.setting_name.or(self.setting_name),
        }
    }
}

/// Which string of a [`LabelSet`] is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Button label
    Button,
    /// Prompt message
    Prompt,
    /// Setting name
    Setting,
}

/// Display strings for every category.
///
/// Deserializing reads a sparse set of overrides and layers it over
/// [`LabelTable::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LabelOverrides")]
pub struct LabelTable {
    /// Fingerprint alone
    pub fingerprint: LabelSet,
    /// Face alone
    pub face: LabelSet,
    /// Iris alone
    pub iris: LabelSet,
    /// Credential alone
    pub credential: LabelSet,
    /// Credential or fingerprint
    pub credential_or_fingerprint: LabelSet,
    /// Credential or face
    pub credential_or_face: LabelSet,
    /// Credential or another biometric
    pub credential_or_biometric: LabelSet,
    /// Several biometrics
    pub biometric: LabelSet,
}

impl Default for LabelTable {
    fn default() -> Self {
        let biometric = LabelSet::new(
            "Use biometrics",
            "Use your biometric to continue",
            "Use biometrics",
        );
        Self {
            fingerprint: LabelSet::new(
                "Use fingerprint",
                "Use your fingerprint to continue",
                "Use fingerprint",
            ),
            face: LabelSet::new("Use face", "Use your face to continue", "Use face"),
            iris: biometric.clone(),
            credential: LabelSet::new(
                "Use screen lock",
                "Enter your screen lock to continue",
                "Use screen lock",
            ),
            credential_or_fingerprint: LabelSet::new(
                "Use fingerprint or screen lock",
                "Use your fingerprint or screen lock to continue",
                "Use fingerprint or screen lock",
            ),
            credential_or_face: LabelSet::new(
                "Use face or screen lock",
                "Use your face or screen lock to continue",
                "Use face or screen lock",
            ),
            credential_or_biometric: LabelSet::new(
                "Use biometrics or screen lock",
                "Use your biometric or screen lock to continue",
                "Use biometrics or screen lock",
            ),
            biometric,
        }
    }
}

/// Sparse on-disk form of [`LabelTable`]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LabelOverrides {
    fingerprint: LabelSet,
    face: LabelSet,
    iris: LabelSet,
    credential: LabelSet,
    credential_or_fingerprint: LabelSet,
    credential_or_face: LabelSet,
    credential_or_biometric: LabelSet,
    biometric: LabelSet,
}

impl From<LabelOverrides> for LabelTable {
    fn from(overrides: LabelOverrides) -> Self {
        let defaults = LabelTable::default();
        Self {
            fingerprint: defaults.fingerprint.merged(overrides.fingerprint),
            face: defaults.face.merged(overrides.face),
            iris: defaults.iris.merged(overrides.iris),
            credential: defaults.credential.merged(overrides.credential),
            credential_or_fingerprint: defaults
                .credential_or_fingerprint
                .merged(overrides.credential_or_fingerprint),
            credential_or_face: defaults
                .credential_or_face
                .merged(overrides.credential_or_face),
            credential_or_biometric: defaults
                .credential_or_biometric
                .merged(overrides.credential_or_biometric),
            biometric: defaults.biometric.merged(overrides.biometric),
        }
    }
}

impl LabelTable {
    /// Strings for a category. `NoModality` has none.
    pub fn labels(&self, category: DisplayCategory) -> Option<&LabelSet> {
        match category {
            DisplayCategory::NoModality => None,
            DisplayCategory::Fingerprint => Some(&self.fingerprint),
            DisplayCategory::Face => Some(&self.face),
            DisplayCategory::Iris => Some(&self.iris),
            DisplayCategory::CredentialOnly => Some(&self.credential),
            DisplayCategory::CredentialOr(CredentialPairing::Fingerprint) => {
                Some(&self.credential_or_fingerprint)
            }
            DisplayCategory::CredentialOr(CredentialPairing::Face) => {
                Some(&self.credential_or_face)
            }
            DisplayCategory::CredentialOr(CredentialPairing::OtherBiometric) => {
                Some(&self.credential_or_biometric)
            }
            DisplayCategory::GenericBiometric => Some(&self.biometric),
        }
    }

    /// One string for a category
    pub fn label(&self, category: DisplayCategory, kind: LabelKind) -> Option<String> {
        let set = self.labels(category)?;
        match kind {
            LabelKind::Button => set.button_label.clone(),
            LabelKind::Prompt => set.prompt_message.clone(),
            LabelKind::Setting => set.setting_name.clone(),
        }
    }
}
