//! Thread-local calling identity
//!
//! Incoming calls are served on the thread that received them, so the caller's
//! identity is tracked per thread. The transport layer marks the start of a call
//! with [`ThreadLocalIdentity::enter_call`]; the router elevates to the service's
//! own identity with `clear_calling_identity` and restores afterwards.

use biogate_core::effects::{IdentityEffects, IdentityToken};
use biogate_core::CallerIdentity;
use std::cell::Cell;
use tracing::trace;

thread_local! {
    static CURRENT_CALLER: Cell<Option<CallerIdentity>> = const { Cell::new(None) };
}

/// Identity handler backed by a thread-local slot.
///
/// When no call is in progress on the current thread the service's own identity
/// is reported.
#[derive(Debug, Clone, Copy)]
pub struct ThreadLocalIdentity {
    service: CallerIdentity,
}

impl ThreadLocalIdentity {
    /// Create a handler for a service running as `service`
    pub fn new(service: CallerIdentity) -> Self {
        Self { service }
    }

    /// Identity of the service itself
    pub fn service_identity(&self) -> CallerIdentity {
        self.service
    }

    /// Mark the current thread as serving a call from `caller`.
    ///
    /// The previous identity is restored when the returned guard drops.
    pub fn enter_call(&self, caller: CallerIdentity) -> IncomingCall {
        let previous = CURRENT_CALLER.with(|slot| slot.replace(Some(caller)));
        trace!(%caller, "incoming call");
        IncomingCall { previous }
    }
}

impl IdentityEffects for ThreadLocalIdentity {
    fn calling_identity(&self) -> CallerIdentity {
        CURRENT_CALLER.with(Cell::get).unwrap_or(self.service)
    }

    fn clear_calling_identity(&self) -> IdentityToken {
        let previous = self.calling_identity();
        CURRENT_CALLER.with(|slot| slot.set(Some(self.service)));
        IdentityToken::new(previous)
    }

    fn restore_calling_identity(&self, token: IdentityToken) {
        CURRENT_CALLER.with(|slot| slot.set(Some(token.previous())));
    }
}

/// Guard for one incoming call on the current thread.
#[derive(Debug)]
#[must_use = "dropping the guard ends the call immediately"]
pub struct IncomingCall {
    previous: Option<CallerIdentity>,
}

impl Drop for IncomingCall {
    fn drop(&mut self) {
        CURRENT_CALLER.with(|slot| slot.set(self.previous));
    }
}
