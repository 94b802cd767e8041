//! Startup registration
//!
//! Parser -> adapters -> backends. Nothing here can fail startup: rejected
//! entries, missing backends and unreachable backends all end up in the
//! [`RegistrationReport`] and the log.

use crate::adapters::{AdapterOutcome, ProviderSet, SensorPropertiesFactory};
use crate::config::ServiceConfig;
use crate::parser::{parse_sensor_configs, RejectedEntry};
use biogate_core::{SensorDescriptor, SensorModality};
use std::collections::HashSet;
use tracing::{error, info};

/// Summary of one startup registration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Descriptors parsed from configuration
    pub descriptors: Vec<SensorDescriptor>,
    /// Entries skipped by the parser
    pub rejected: Vec<RejectedEntry>,
    /// Descriptors no adapter accepts, plus duplicate registry keys
    pub unroutable: Vec<SensorDescriptor>,
    /// Outcome per biometric modality, in registration order
    pub outcomes: Vec<(SensorModality, AdapterOutcome)>,
}

impl RegistrationReport {
    /// Sensors accepted by a backend
    pub fn registered_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                AdapterOutcome::Registered { count } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Outcome for one modality
    pub fn outcome(&self, modality: SensorModality) -> Option<&AdapterOutcome> {
        self.outcomes
            .iter()
            .find(|(m, _)| *m == modality)
            .map(|(_, outcome)| outcome)
    }

    /// Modalities available after startup
    pub fn available_modalities(&self) -> Vec<SensorModality> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_registered())
            .map(|(modality, _)| *modality)
            .collect()
    }
}

/// Parse configured sensors and hand them to each modality's backend.
pub fn register_authenticators(config: &ServiceConfig, providers: &ProviderSet) -> RegistrationReport {
    let parsed = parse_sensor_configs(config.legacy_sensor_strings());

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(parsed.descriptors.len());
    let mut unroutable = Vec::new();
    for descriptor in parsed.descriptors {
        if descriptor.modality() == SensorModality::None {
            error!(%descriptor, "configuration inconsistency: sensor without a modality");
            unroutable.push(descriptor);
        } else if !seen.insert(descriptor.registry_key()) {
            error!(%descriptor, "configuration inconsistency: duplicate sensor id");
            unroutable.push(descriptor);
        } else {
            descriptors.push(descriptor);
        }
    }

    let properties = SensorPropertiesFactory::from_config(config);
    let outcomes = providers
        .adapters(&properties)
        .into_iter()
        .map(|adapter| (adapter.modality(), adapter.register(&descriptors)))
        .collect();

    let report = RegistrationReport {
        descriptors,
        rejected: parsed.rejected,
        unroutable,
        outcomes,
    };
    info!(
        parsed = report.descriptors.len(),
        rejected = report.rejected.len(),
        registered = report.registered_count(),
        "sensor registration finished"
    );
    report
}
