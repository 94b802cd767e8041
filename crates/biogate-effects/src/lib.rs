//! # Biogate Effects - Layer 3: Production Handlers
//!
//! Stateless handlers for the ambient effect traits defined in `biogate-core`:
//!
//! - [`ThreadLocalIdentity`]: per-thread calling identity with clear/restore
//! - [`FilesystemProbe`]: environment probe over a (possibly re-rooted) device tree
//! - [`select_notifier`]: one-time choice of the vendor sensor notifier
//!
//! **For testing**: use the recording mocks from `biogate-testkit`.

pub mod identity;
pub mod notifier;
pub mod probe;

pub use identity::{IncomingCall, ThreadLocalIdentity};
pub use notifier::{
    select_notifier, FallbackNotifier, LoggingCommandSink, SpotDaemonNotifier, TouchPanelNotifier,
};
pub use probe::FilesystemProbe;
