//! # Biogate Testkit
//!
//! Deterministic, recording implementations of every collaborator trait in
//! `biogate-core`. State lives behind `Arc<Mutex<..>>` so a test keeps a clone
//! of each mock and inspects it after driving the service.

#![allow(missing_docs)]

pub mod environment;
pub mod mock_authority;
pub mod mock_effects;

pub use environment::{MockProbe, RecordingCommandSink};
pub use mock_authority::{
    AuthorityCall, MockAuthority, MockBackend, NoopCallback, ReceivedError, RecordedCall,
    RecordingReceiver,
};
pub use mock_effects::{MockPolicyEffects, NotedOp, SERVICE_IDENTITY};

/// Install a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
