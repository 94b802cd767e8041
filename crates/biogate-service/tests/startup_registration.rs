//! Startup: configuration -> parser -> adapters -> backends -> authority

use biogate_core::effects::VendorCommand;
use biogate_core::{
    BiometricError, SensorDescriptor, SensorDetails, SensorModality, SensorStrength,
};
use biogate_effects::notifier::TOUCH_PANEL_COMMAND_LIST;
use biogate_effects::select_notifier;
use biogate_service::{
    parse_sensor_configs, register_authenticators, AdapterOutcome, AuthService, ProviderSet,
    ServiceConfig,
};
use biogate_testkit::{
    init_tracing, MockAuthority, MockBackend, MockPolicyEffects, MockProbe, RecordingCommandSink,
};
use proptest::prelude::*;
use std::io::Write;
use std::sync::Arc;

fn config_with(sensors: &[&str]) -> ServiceConfig {
    ServiceConfig {
        sensors: Some(sensors.iter().map(|s| s.to_string()).collect()),
        ..ServiceConfig::default()
    }
}

#[test]
fn unknown_modality_skips_only_that_entry() {
    init_tracing();
    let parsed = parse_sensor_configs(Some(&["0:2:15", "1:6:15", "2:8:255"][..]));

    assert_eq!(
        parsed.descriptors,
        vec![
            SensorDescriptor::new(0, SensorModality::Fingerprint, SensorStrength::Strong),
            SensorDescriptor::new(2, SensorModality::Face, SensorStrength::Weak),
        ]
    );
    assert_eq!(parsed.rejected.len(), 1);
    assert_eq!(parsed.rejected[0].index, 1);
    assert!(matches!(
        parsed.rejected[0].reason,
        BiometricError::ConfigurationInconsistency { .. }
    ));
}

#[test]
fn sensors_reach_the_authority_through_their_backend() {
    init_tracing();
    let authority = MockAuthority::new();
    let fingerprint = MockBackend::new(SensorModality::Fingerprint).forwarding_to(&authority);
    let face = MockBackend::new(SensorModality::Face).forwarding_to(&authority);
    let providers = ProviderSet::new()
        .with_backend(Arc::new(fingerprint.clone()))
        .with_backend(Arc::new(face.clone()));

    let report = register_authenticators(&config_with(&["0:2:15", "1:8:255"]), &providers);

    assert_eq!(report.registered_count(), 2);
    assert_eq!(fingerprint.registered_ids(), vec![0]);
    assert_eq!(face.registered_ids(), vec![1]);
    assert_eq!(
        authority.registered(),
        vec![
            SensorDescriptor::new(0, SensorModality::Fingerprint, SensorStrength::Strong),
            SensorDescriptor::new(1, SensorModality::Face, SensorStrength::Weak),
        ]
    );
    assert_eq!(
        report.outcome(SensorModality::Iris),
        Some(&AdapterOutcome::BackendAbsent { expected: 0 })
    );
    assert_eq!(
        report.available_modalities(),
        vec![SensorModality::Fingerprint, SensorModality::Face]
    );
}

#[test]
fn missing_backend_is_an_inconsistency_not_a_failure() {
    init_tracing();
    let fingerprint = MockBackend::new(SensorModality::Fingerprint);
    let providers = ProviderSet::new().with_backend(Arc::new(fingerprint.clone()));

    let report = register_authenticators(&config_with(&["0:2:15", "1:8:255"]), &providers);

    assert_eq!(
        report.outcome(SensorModality::Face),
        Some(&AdapterOutcome::BackendAbsent { expected: 1 })
    );
    assert_eq!(fingerprint.registered_ids(), vec![0]);
}

#[test]
fn unreachable_backend_is_treated_as_absent() {
    init_tracing();
    let face = MockBackend::new(SensorModality::Face);
    face.fail_with(BiometricError::transport("face service died"));
    let fingerprint = MockBackend::new(SensorModality::Fingerprint);
    let providers = ProviderSet::new()
        .with_backend(Arc::new(face))
        .with_backend(Arc::new(fingerprint.clone()));

    let report = register_authenticators(&config_with(&["0:2:15", "1:8:255"]), &providers);

    assert!(matches!(
        report.outcome(SensorModality::Face),
        Some(AdapterOutcome::BackendFailed { count: 1, .. })
    ));
    assert_eq!(report.available_modalities(), vec![SensorModality::Fingerprint]);
    assert_eq!(fingerprint.registered_ids(), vec![0]);
}

#[test]
fn disabled_legacy_transport_still_calls_backends() {
    init_tracing();
    let face = MockBackend::new(SensorModality::Face);
    let providers = ProviderSet::new().with_backend(Arc::new(face.clone()));
    let config = ServiceConfig {
        legacy_transport_disabled: true,
        ..config_with(&["1:8:255"])
    };

    let report = register_authenticators(&config, &providers);

    assert!(report.descriptors.is_empty());
    assert_eq!(face.registrations(), vec![Vec::new()]);
}

#[test]
fn duplicate_and_modality_less_entries_are_unroutable() {
    init_tracing();
    let fingerprint = MockBackend::new(SensorModality::Fingerprint);
    let providers = ProviderSet::new().with_backend(Arc::new(fingerprint.clone()));

    let report =
        register_authenticators(&config_with(&["0:2:15", "0:2:255", "5:0:15"]), &providers);

    assert_eq!(report.unroutable.len(), 2);
    assert_eq!(fingerprint.registered_ids(), vec![0]);
    assert_eq!(
        fingerprint.registrations()[0][0].descriptor.strength(),
        SensorStrength::Strong
    );
}

#[test]
fn under_display_details_are_forwarded() {
    init_tracing();
    let fingerprint = MockBackend::new(SensorModality::Fingerprint);
    let providers = ProviderSet::new().with_backend(Arc::new(fingerprint.clone()));
    let config = ServiceConfig::from_toml_str(
        r#"
        sensors = ["0:2:15"]

        [fingerprint]
        under_display = { x = 540, y = 2000, radius = 80 }
        max_enrollments_per_user = 4
        "#,
    )
    .unwrap();

    register_authenticators(&config, &providers);

    let registered = &fingerprint.registrations()[0][0];
    assert_eq!(registered.max_enrollments_per_user, 4);
    assert!(matches!(
        registered.details,
        SensorDetails::Fingerprint {
            kind,
            location: Some(_),
            ..
        } if kind.is_under_display()
    ));
}

#[test]
fn config_file_drives_service_start() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sensors = [\"0:2:0xf\", \"1:8:0xff\", \"bogus\"]").unwrap();
    writeln!(file, "ui_package = \"com.example.prompt\"").unwrap();
    let config = ServiceConfig::load(file.path()).unwrap();

    let sink = RecordingCommandSink::new();
    let probe = MockProbe::new().with_file(TOUCH_PANEL_COMMAND_LIST, &["fod_enable"]);
    let authority = MockAuthority::new();
    let service = AuthService::new(
        MockPolicyEffects::app_caller(),
        Arc::new(authority.clone()),
        config,
    )
    .with_notifier(select_notifier(&probe, Arc::new(sink.clone())));
    let providers = ProviderSet::new()
        .with_backend(Arc::new(
            MockBackend::new(SensorModality::Fingerprint).forwarding_to(&authority),
        ));

    let report = service.on_start(&providers);

    assert_eq!(service.config().ui_package, "com.example.prompt");
    assert_eq!(report.descriptors.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.registered_count(), 1);
    assert_eq!(authority.registered().len(), 1);
    assert_eq!(
        sink.commands(),
        vec![VendorCommand::TouchPanel("fod_enable,1,1,0".to_string())]
    );
}

#[test]
fn missing_config_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServiceConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, BiometricError::Invalid { .. }));
}

proptest! {
    #[test]
    fn parser_accounts_for_every_entry(entries in prop::collection::vec(".{0,16}", 0..12)) {
        let parsed = parse_sensor_configs(Some(&entries[..]));
        prop_assert_eq!(parsed.descriptors.len() + parsed.rejected.len(), entries.len());

        let mut last = None;
        for rejected in &parsed.rejected {
            prop_assert_eq!(&entries[rejected.index], &rejected.raw);
            prop_assert!(last.map_or(true, |prev| prev < rejected.index));
            last = Some(rejected.index);
        }
    }

    #[test]
    fn valid_entries_survive_invalid_neighbours(
        id in 0i32..1000,
        modality in prop::sample::select(vec![2u32, 4, 8]),
        strength in prop::sample::select(vec![0x0Fu32, 0xFF, 0xFFF]),
        noise in "[a-z:]{0,10}",
    ) {
        let valid = format!("{id}:{modality}:{strength:#x}");
        let entries = vec![noise.clone(), valid, noise];
        let parsed = parse_sensor_configs(Some(&entries[..]));

        prop_assert!(parsed.descriptors.iter().any(|d| d.id() == id
            && d.modality().code() == modality
            && d.strength().code() == strength));
    }
}
