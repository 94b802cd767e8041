//! Privilege-elevation scope
//!
//! Every downstream authority call runs under the service's own identity.
//! [`ServiceIdentityScope`] clears the caller's identity when created and
//! restores it when dropped, so restoration happens on every exit path:
//! normal return, `?` propagation and unwinding.
//!
//! The guard is `!Send`: it belongs to the invocation that created it.

use biogate_core::effects::{IdentityEffects, IdentityToken};
use std::marker::PhantomData;
use tracing::trace;

/// RAII guard holding the service identity for its lifetime
#[must_use = "dropping the scope immediately restores the caller's identity"]
pub struct ServiceIdentityScope<'a, I: IdentityEffects + ?Sized> {
    identity: &'a I,
    token: Option<IdentityToken>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, I: IdentityEffects + ?Sized> ServiceIdentityScope<'a, I> {
    /// Clear the caller's identity until the returned guard is dropped.
    pub fn enter(identity: &'a I) -> Self {
        let token = identity.clear_calling_identity();
        trace!(caller = %token.previous(), "entered service identity scope");
        Self {
            identity,
            token: Some(token),
            _not_send: PhantomData,
        }
    }
}

impl<I: IdentityEffects + ?Sized> Drop for ServiceIdentityScope<'_, I> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            trace!(caller = %token.previous(), "restoring caller identity");
            self.identity.restore_calling_identity(token);
        }
    }
}

/// Run `f` under the service identity, restoring the caller's afterwards.
pub fn with_service_identity<I, T, F>(identity: &I, f: F) -> T
where
    I: IdentityEffects + ?Sized,
    F: FnOnce() -> T,
{
    let _scope = ServiceIdentityScope::enter(identity);
    f()
}
