//! Mock policy effects
//!
//! `MockPolicyEffects` implements every policy trait the gate consults, with
//! state shared behind an `Arc` so a test can keep a clone and inspect what the
//! service did: which permissions were checked, which app ops were noted, and
//! how many times the calling identity was cleared and restored.

use biogate_core::effects::{
    AppOpMode, AppOpsEffects, IdentityEffects, IdentityToken, Permission, PermissionEffects,
    ProcessStateEffects,
};
use biogate_core::CallerIdentity;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Identity the mock service runs as
pub const SERVICE_IDENTITY: CallerIdentity = CallerIdentity {
    user_id: 0,
    uid: 1000,
    pid: 1,
};

/// App op noted by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotedOp {
    /// Caller uid
    pub uid: u32,
    /// Package, if one was supplied
    pub package: Option<String>,
    /// Reason string
    pub reason: String,
}

/// Deterministic policy effects for tests
#[derive(Debug, Clone)]
pub struct MockPolicyEffects {
    state: Arc<Mutex<PolicyState>>,
}

#[derive(Debug)]
struct PolicyState {
    caller: CallerIdentity,
    current: CallerIdentity,
    granted: HashSet<Permission>,
    app_op_mode: AppOpMode,
    foreground: bool,
    identity_clears: usize,
    identity_restores: usize,
    permission_checks: Vec<Permission>,
    noted_ops: Vec<NotedOp>,
}

impl MockPolicyEffects {
    /// Caller with no permissions, allowed app op, in the foreground
    pub fn new(caller: CallerIdentity) -> Self {
        Self {
            state: Arc::new(Mutex::new(PolicyState {
                caller,
                current: caller,
                granted: HashSet::new(),
                app_op_mode: AppOpMode::Allowed,
                foreground: true,
                identity_clears: 0,
                identity_restores: 0,
                permission_checks: Vec::new(),
                noted_ops: Vec::new(),
            })),
        }
    }

    /// Ordinary app caller for user 0 holding `USE_BIOMETRIC`
    pub fn app_caller() -> Self {
        Self::new(CallerIdentity::new(0, 10_100, 4_321)).grant(Permission::UseBiometric)
    }

    /// Grant a permission
    pub fn grant(self, permission: Permission) -> Self {
        self.state.lock().granted.insert(permission);
        self
    }

    /// Revoke a permission
    pub fn revoke(&self, permission: Permission) {
        self.state.lock().granted.remove(&permission);
    }

    /// Set the app-ops answer
    pub fn with_app_op_mode(self, mode: AppOpMode) -> Self {
        self.state.lock().app_op_mode = mode;
        self
    }

    /// Set whether the caller is foreground
    pub fn with_foreground(self, foreground: bool) -> Self {
        self.state.lock().foreground = foreground;
        self
    }

    /// Identity of the caller
    pub fn caller(&self) -> CallerIdentity {
        self.state.lock().caller
    }

    /// Number of `clear_calling_identity` calls
    pub fn identity_clears(&self) -> usize {
        self.state.lock().identity_clears
    }

    /// Number of `restore_calling_identity` calls
    pub fn identity_restores(&self) -> usize {
        self.state.lock().identity_restores
    }

    /// Returns `true` while running under the service identity.
    pub fn is_elevated(&self) -> bool {
        let state = self.state.lock();
        state.current == SERVICE_IDENTITY && state.caller != SERVICE_IDENTITY
    }

    /// Permissions checked so far, in order
    pub fn permission_checks(&self) -> Vec<Permission> {
        self.state.lock().permission_checks.clone()
    }

    /// App ops noted so far, in order
    pub fn noted_ops(&self) -> Vec<NotedOp> {
        self.state.lock().noted_ops.clone()
    }
}

impl IdentityEffects for MockPolicyEffects {
    fn calling_identity(&self) -> CallerIdentity {
        self.state.lock().current
    }

    fn clear_calling_identity(&self) -> IdentityToken {
        let mut state = self.state.lock();
        state.identity_clears += 1;
        let token = IdentityToken::new(state.current);
        state.current = SERVICE_IDENTITY;
        token
    }

    fn restore_calling_identity(&self, token: IdentityToken) {
        let mut state = self.state.lock();
        state.identity_restores += 1;
        state.current = token.previous();
    }
}

impl PermissionEffects for MockPolicyEffects {
    fn check_calling_or_self_permission(&self, permission: Permission) -> bool {
        let mut state = self.state.lock();
        state.permission_checks.push(permission);
        state.granted.contains(&permission)
    }
}

impl AppOpsEffects for MockPolicyEffects {
    fn note_op(&self, uid: u32, package: Option<&str>, reason: &str) -> AppOpMode {
        let mut state = self.state.lock();
        state.noted_ops.push(NotedOp {
            uid,
            package: package.map(str::to_string),
            reason: reason.to_string(),
        });
        state.app_op_mode
    }
}

impl ProcessStateEffects for MockPolicyEffects {
    fn is_foreground(&self, _uid: u32, _pid: u32) -> bool {
        self.state.lock().foreground
    }
}
