//! Request router behaviour against recording collaborators
//!
//! Every test wires `AuthService` to a `MockPolicyEffects` and a
//! `MockAuthority` observing it, so each authority call records whether the
//! service identity was active.

use assert_matches::assert_matches;
use biogate_core::effects::{
    AppOpMode, BiometricServiceReceiver, IdentityEffects, Permission, VendorCommand,
};
use biogate_core::{
    BiometricError, BiometricStatus, CallerIdentity, ClientToken, CredentialPairing,
    DisplayCategory, LabelKind, ModalityBitmask, PromptConfig, ReceiverErrorCode, RequestId,
};
use biogate_effects::notifier::TOUCH_PANEL_COMMAND_LIST;
use biogate_effects::select_notifier;
use biogate_service::{AuthService, AuthenticateOutcome, FastFailReason, ServiceConfig};
use biogate_testkit::{
    init_tracing, AuthorityCall, MockAuthority, MockPolicyEffects, MockProbe, NoopCallback,
    ReceivedError, RecordingCommandSink, RecordingReceiver,
};
use std::sync::Arc;

const PACKAGE: &str = "com.example.bank";

struct Harness {
    effects: MockPolicyEffects,
    authority: MockAuthority,
    service: AuthService<MockPolicyEffects>,
}

fn harness_with(effects: MockPolicyEffects, authority: MockAuthority) -> Harness {
    init_tracing();
    let authority = authority.observed_by(&effects);
    let service = AuthService::new(
        effects.clone(),
        Arc::new(authority.clone()),
        ServiceConfig::default(),
    );
    Harness {
        effects,
        authority,
        service,
    }
}

fn harness(effects: MockPolicyEffects) -> Harness {
    harness_with(effects, MockAuthority::new())
}

fn fingerprint_prompt() -> PromptConfig {
    PromptConfig::new("Confirm payment", ModalityBitmask::FINGERPRINT)
}

fn recording_receiver() -> (RecordingReceiver, Option<Arc<dyn BiometricServiceReceiver>>) {
    let receiver = RecordingReceiver::new();
    let handle: Arc<dyn BiometricServiceReceiver> = Arc::new(receiver.clone());
    (receiver, Some(handle))
}

fn assert_scopes_balanced(effects: &MockPolicyEffects) {
    assert_eq!(effects.identity_clears(), effects.identity_restores());
    assert!(!effects.is_elevated());
    assert_eq!(effects.calling_identity(), effects.caller());
}

const CANCELED: ReceivedError = ReceivedError {
    modality: ModalityBitmask::NONE,
    error: ReceiverErrorCode::Canceled,
    vendor_code: 0,
};

// authenticate

#[test]
fn dispatched_request_runs_under_service_identity() {
    let h = harness(MockPolicyEffects::app_caller());
    let (recorder, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let outcome = h
        .service
        .authenticate(
            Some(ClientToken::new(42)),
            9,
            0,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();

    assert_eq!(
        outcome,
        AuthenticateOutcome::Dispatched {
            request_id: RequestId::new(1)
        }
    );
    let calls = h.authority.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].elevated, Some(true));
    assert_eq!(
        calls[0].call,
        AuthorityCall::Authenticate {
            token: ClientToken::new(42),
            session_id: 9,
            user_id: 0,
            package: PACKAGE.to_string(),
        }
    );
    assert!(recorder.errors().is_empty());
    assert_eq!(h.effects.identity_clears(), 1);
    assert_scopes_balanced(&h.effects);
}

#[test]
fn null_receiver_fast_fails_without_security_failure() {
    let h = harness(MockPolicyEffects::app_caller());
    let prompt = fingerprint_prompt();

    let outcome = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            0,
            None,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();

    assert!(outcome.is_fast_failed());
    assert_eq!(outcome.request_id(), RequestId::NO_SESSION);
    assert_eq!(outcome.request_id().value(), -1);
    assert_eq!(h.authority.call_count(), 0);
    assert_scopes_balanced(&h.effects);
}

#[test]
fn missing_arguments_notify_receiver_exactly_once() {
    let h = harness(MockPolicyEffects::app_caller());
    let (recorder, receiver) = recording_receiver();

    let outcome = h
        .service
        .authenticate(Some(ClientToken::new(1)), 0, 0, receiver, None, None)
        .unwrap();

    assert_matches!(
        outcome,
        AuthenticateOutcome::FastFailed {
            reason: FastFailReason::MissingArguments { .. }
        }
    );
    assert_eq!(recorder.errors(), vec![CANCELED]);
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn background_caller_is_fast_failed() {
    let h = harness(MockPolicyEffects::app_caller().with_foreground(false));
    let (recorder, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let outcome = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            0,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();

    assert_matches!(
        outcome,
        AuthenticateOutcome::FastFailed {
            reason: FastFailReason::NotForeground { ref package }
        } if package == PACKAGE
    );
    assert_eq!(recorder.errors(), vec![CANCELED]);
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn dead_receiver_does_not_turn_fast_fail_into_error() {
    let h = harness(MockPolicyEffects::app_caller().with_foreground(false));
    let dead = RecordingReceiver::unreachable();
    let prompt = fingerprint_prompt();

    let outcome = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            0,
            Some(Arc::new(dead.clone())),
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();

    assert!(outcome.is_fast_failed());
    assert_eq!(dead.errors().len(), 1);
}

#[test]
fn cross_user_without_internal_never_reaches_authority() {
    let h = harness(MockPolicyEffects::app_caller());
    let (recorder, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let err = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            10,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap_err();

    assert!(err.is_security_failure());
    assert_eq!(h.authority.call_count(), 0);
    assert!(h.effects.noted_ops().is_empty());
    assert!(recorder.errors().is_empty());
    assert_eq!(h.effects.identity_clears(), 0);
}

#[test]
fn cross_user_with_internal_is_dispatched() {
    let h = harness(MockPolicyEffects::app_caller().grant(Permission::UseBiometricInternal));
    let (_, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let outcome = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            10,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();
    assert_eq!(outcome.request_id(), RequestId::new(1));
}

#[test]
fn denied_app_op_is_a_policy_violation() {
    let h = harness(MockPolicyEffects::app_caller().with_app_op_mode(AppOpMode::Errored));
    let (recorder, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let result = h.service.authenticate(
        Some(ClientToken::new(1)),
        0,
        0,
        receiver,
        Some(PACKAGE),
        Some(&prompt),
    );

    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
    assert!(recorder.errors().is_empty());
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn private_prompt_options_need_internal_even_with_test_permission() {
    let h = harness(MockPolicyEffects::app_caller().grant(Permission::TestBiometric));
    let (_, receiver) = recording_receiver();
    let mut prompt = fingerprint_prompt();
    prompt.receive_system_events = true;

    let result = h.service.authenticate(
        Some(ClientToken::new(1)),
        0,
        0,
        receiver,
        Some(PACKAGE),
        Some(&prompt),
    );
    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn transport_failure_propagates_unchanged_and_restores_identity() {
    let h = harness(MockPolicyEffects::app_caller());
    h.authority
        .fail_with(BiometricError::transport("authority died"));
    let (recorder, receiver) = recording_receiver();
    let prompt = fingerprint_prompt();

    let err = h
        .service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            0,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap_err();

    assert_eq!(err, BiometricError::transport("authority died"));
    assert!(recorder.errors().is_empty());
    assert_eq!(h.effects.identity_clears(), 1);
    assert_scopes_balanced(&h.effects);
}

#[test]
fn scope_enter_and_exit_counts_match_on_every_path() {
    let effects = MockPolicyEffects::app_caller();
    let h = harness(effects.clone());
    let prompt = fingerprint_prompt();

    // success
    let (_, receiver) = recording_receiver();
    h.service
        .authenticate(
            Some(ClientToken::new(1)),
            0,
            0,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap();
    assert_scopes_balanced(&effects);

    // soft failure
    h.service
        .authenticate(Some(ClientToken::new(2)), 0, 0, None, Some(PACKAGE), Some(&prompt))
        .unwrap();
    assert_scopes_balanced(&effects);

    // hard failure
    h.service
        .authenticate(Some(ClientToken::new(3)), 0, 7, None, Some(PACKAGE), Some(&prompt))
        .unwrap_err();
    assert_scopes_balanced(&effects);

    // transport failure
    h.authority.fail_with(BiometricError::transport("gone"));
    let (_, receiver) = recording_receiver();
    h.service
        .authenticate(
            Some(ClientToken::new(4)),
            0,
            0,
            receiver,
            Some(PACKAGE),
            Some(&prompt),
        )
        .unwrap_err();
    assert_scopes_balanced(&effects);
    assert_eq!(effects.identity_clears(), 2);
}

// cancel

#[test]
fn cancel_with_missing_token_is_ignored() {
    let h = harness(MockPolicyEffects::app_caller());
    h.service
        .cancel_authentication(None, Some(PACKAGE), RequestId::new(3))
        .unwrap();
    h.service
        .cancel_authentication(Some(ClientToken::new(1)), None, RequestId::new(3))
        .unwrap();
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn cancel_is_forwarded_elevated() {
    let h = harness(MockPolicyEffects::app_caller());
    h.service
        .cancel_authentication(Some(ClientToken::new(5)), Some(PACKAGE), RequestId::new(3))
        .unwrap();

    let calls = h.authority.recorded_calls();
    assert_eq!(
        calls[0].call,
        AuthorityCall::CancelAuthentication {
            token: ClientToken::new(5),
            package: PACKAGE.to_string(),
            request_id: RequestId::new(3),
        }
    );
    assert_eq!(calls[0].elevated, Some(true));
}

#[test]
fn cancel_requires_biometric_permission() {
    let h = harness(MockPolicyEffects::new(CallerIdentity::new(0, 10_300, 5)));
    let result =
        h.service
            .cancel_authentication(Some(ClientToken::new(5)), Some(PACKAGE), RequestId::new(3));
    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
}

// capability queries

#[test]
fn can_authenticate_passes_caller_user() {
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new().with_status(BiometricStatus::NoneEnrolled),
    );

    let status = h
        .service
        .can_authenticate(PACKAGE, 0, ModalityBitmask::FACE)
        .unwrap();

    assert_eq!(status, BiometricStatus::NoneEnrolled);
    assert_eq!(status.code(), 11);
    assert_eq!(
        h.authority.calls(),
        vec![AuthorityCall::CanAuthenticate {
            package: PACKAGE.to_string(),
            user_id: 0,
            calling_user_id: 0,
            requested: ModalityBitmask::FACE,
        }]
    );
}

// display labels

#[test]
fn fingerprint_or_credential_resolves_to_credential_or_fingerprint() {
    let both = ModalityBitmask::FINGERPRINT | ModalityBitmask::CREDENTIAL;
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new().with_current_modality(both),
    );

    let button = h
        .service
        .resolve_display_label(LabelKind::Button, 0, PACKAGE, both)
        .unwrap();
    assert_eq!(
        button.category,
        DisplayCategory::CredentialOr(CredentialPairing::Fingerprint)
    );
    assert_eq!(
        button.text.as_deref(),
        Some("Use fingerprint or screen lock")
    );
    assert_eq!(
        h.service.get_prompt_message(0, PACKAGE, both).unwrap().as_deref(),
        Some("Use your fingerprint or screen lock to continue")
    );
}

#[test]
fn several_biometrics_resolve_to_generic_biometric() {
    let both = ModalityBitmask::FINGERPRINT | ModalityBitmask::FACE;
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new().with_current_modality(both),
    );

    for kind in [LabelKind::Button, LabelKind::Prompt] {
        let label = h
            .service
            .resolve_display_label(kind, 0, PACKAGE, both)
            .unwrap();
        assert_eq!(label.category, DisplayCategory::GenericBiometric);
    }
    assert_eq!(
        h.service.get_button_label(0, PACKAGE, both).unwrap().as_deref(),
        Some("Use biometrics")
    );
}

#[test]
fn nothing_available_yields_neutral_label() {
    let h = harness(MockPolicyEffects::app_caller());
    let label = h
        .service
        .resolve_display_label(LabelKind::Button, 0, PACKAGE, ModalityBitmask::FACE)
        .unwrap();
    assert_eq!(label.category, DisplayCategory::NoModality);
    assert_eq!(label.text, None);
}

#[test]
fn setting_name_uses_supported_modalities() {
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new()
            .with_current_modality(ModalityBitmask::NONE)
            .with_supported_modalities(ModalityBitmask::FACE),
    );

    let name = h
        .service
        .get_setting_name(0, PACKAGE, ModalityBitmask::FACE)
        .unwrap();

    assert_eq!(name.as_deref(), Some("Use face"));
    assert_eq!(
        h.authority.calls(),
        vec![AuthorityCall::SupportedModalities {
            requested: ModalityBitmask::FACE
        }]
    );
}

#[test]
fn setting_name_for_fingerprint_and_credential() {
    let supported = ModalityBitmask::FINGERPRINT | ModalityBitmask::CREDENTIAL;
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new()
            .with_current_modality(ModalityBitmask::NONE)
            .with_supported_modalities(supported),
    );

    let label = h
        .service
        .resolve_display_label(LabelKind::Setting, 0, PACKAGE, supported)
        .unwrap();
    assert_eq!(
        label.category,
        DisplayCategory::CredentialOr(CredentialPairing::Fingerprint)
    );
    assert_eq!(
        h.service.get_setting_name(0, PACKAGE, supported).unwrap().as_deref(),
        Some("Use fingerprint or screen lock")
    );
}

#[test]
fn setting_name_for_several_biometrics_and_credential() {
    let supported =
        ModalityBitmask::FINGERPRINT | ModalityBitmask::FACE | ModalityBitmask::CREDENTIAL;
    let h = harness_with(
        MockPolicyEffects::app_caller(),
        MockAuthority::new()
            .with_current_modality(ModalityBitmask::NONE)
            .with_supported_modalities(supported),
    );

    let label = h
        .service
        .resolve_display_label(LabelKind::Setting, 0, PACKAGE, supported)
        .unwrap();
    assert_eq!(label.category, DisplayCategory::GenericBiometric);
    assert_eq!(
        h.service.get_setting_name(0, PACKAGE, supported).unwrap().as_deref(),
        Some("Use biometrics")
    );
}

#[test]
fn label_for_other_user_requires_internal() {
    let h = harness(MockPolicyEffects::app_caller());
    let result = h
        .service
        .get_button_label(11, PACKAGE, ModalityBitmask::FINGERPRINT);
    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
    assert_eq!(h.authority.call_count(), 0);
}

// authenticator ids

#[test]
fn same_user_authenticator_ids_skip_permission_check() {
    let h = harness_with(
        MockPolicyEffects::new(CallerIdentity::new(0, 1_017, 300)),
        MockAuthority::new().with_authenticator_ids(vec![11, 22]),
    );

    let ids = h.service.get_authenticator_ids(0).unwrap();

    assert_eq!(ids, vec![11, 22]);
    assert!(h.effects.permission_checks().is_empty());
    assert_eq!(h.authority.recorded_calls()[0].elevated, Some(true));
}

#[test]
fn cross_user_authenticator_ids_need_internal() {
    let h = harness(MockPolicyEffects::new(CallerIdentity::new(0, 1_017, 300)));
    let result = h.service.get_authenticator_ids(10);
    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
    assert_eq!(h.authority.call_count(), 0);

    let h = harness(
        MockPolicyEffects::new(CallerIdentity::new(0, 1_017, 300))
            .grant(Permission::UseBiometricInternal),
    );
    assert!(h.service.get_authenticator_ids(10).is_ok());
}

// test and internal operations

#[test]
fn test_session_needs_only_test_permission() {
    let h = harness(
        MockPolicyEffects::new(CallerIdentity::new(0, 2_000, 10)).grant(Permission::TestBiometric),
    );
    let handle = h
        .service
        .create_test_session(3, Arc::new(NoopCallback), "com.example.harness")
        .unwrap();
    assert_eq!(handle.sensor_id, 3);

    let h = harness(MockPolicyEffects::app_caller());
    let result = h
        .service
        .create_test_session(3, Arc::new(NoopCallback), PACKAGE);
    assert_matches!(result, Err(BiometricError::PolicyViolation { .. }));
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn ui_package_and_sensor_properties_need_test_permission() {
    let h = harness(MockPolicyEffects::app_caller());
    assert!(h.service.get_ui_package().is_err());
    assert!(h.service.get_sensor_properties(PACKAGE).is_err());

    let h = harness(MockPolicyEffects::app_caller().grant(Permission::TestBiometric));
    assert_eq!(
        h.service.get_ui_package().unwrap(),
        ServiceConfig::default().ui_package
    );
    assert!(h.service.get_sensor_properties(PACKAGE).unwrap().is_empty());
    assert_eq!(
        h.authority.calls(),
        vec![AuthorityCall::SensorProperties {
            package: PACKAGE.to_string()
        }]
    );
}

#[test]
fn internal_operations_reject_ordinary_callers() {
    let h = harness(MockPolicyEffects::app_caller());
    assert!(h.service.has_enrolled_biometrics(0, PACKAGE).is_err());
    assert!(h
        .service
        .register_enabled_on_keyguard_callback(Arc::new(NoopCallback))
        .is_err());
    assert!(h
        .service
        .invalidate_authenticator_ids(0, 0, Arc::new(NoopCallback))
        .is_err());
    assert!(h
        .service
        .reset_lockout_time_bound(ClientToken::new(1), PACKAGE, 0, 0, &[1, 2, 3])
        .is_err());
    assert!(h.service.on_finger_state_changed(true).is_err());
    assert_eq!(h.authority.call_count(), 0);
}

#[test]
fn keyguard_callback_uses_caller_user_not_service_user() {
    let h = harness_with(
        MockPolicyEffects::new(CallerIdentity::new(10, 1_010_000, 40))
            .grant(Permission::UseBiometricInternal),
        MockAuthority::new().with_enrolled(true),
    );

    h.service
        .register_enabled_on_keyguard_callback(Arc::new(NoopCallback))
        .unwrap();
    assert!(h.service.has_enrolled_biometrics(10, PACKAGE).unwrap());

    assert_eq!(
        h.authority.calls(),
        vec![
            AuthorityCall::RegisterKeyguardCallback {
                calling_user_id: 10
            },
            AuthorityCall::HasEnrolledBiometrics {
                user_id: 10,
                package: PACKAGE.to_string()
            },
        ]
    );
    assert_scopes_balanced(&h.effects);
}

// vendor notifier

#[test]
fn finger_state_reaches_selected_notifier() {
    let sink = RecordingCommandSink::new();
    let probe = MockProbe::new().with_file(TOUCH_PANEL_COMMAND_LIST, &["fod_enable"]);
    let notifier = select_notifier(&probe, Arc::new(sink.clone()));

    let effects = MockPolicyEffects::app_caller().grant(Permission::UseBiometricInternal);
    let service = AuthService::new(
        effects,
        Arc::new(MockAuthority::new()),
        ServiceConfig::default(),
    )
    .with_notifier(notifier);

    assert_eq!(service.notifier().vendor(), "touch-panel");
    service.on_finger_state_changed(true).unwrap();
    assert_eq!(
        sink.commands(),
        vec![VendorCommand::FingerState { pressed: true }]
    );
}
