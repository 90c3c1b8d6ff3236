use std::sync::Arc;

use rotor_protocol::LockMsg;
use serde_json::{Map, Value};
use tracing::warn;

use crate::merge::apply;
use crate::persist::KeyValueStore;
use crate::slice::Slice;

/// Key under which the local client identity is persisted.
pub const IDENTITY_KEY: &str = "lock-identity";

/// Soft mutual-exclusion state. The controller is the arbitration
/// authority: it relays whichever LOCK snapshot it last saw to every
/// client, so two clients racing `close_lock` may transiently both
/// believe they hold the lock until the echo lands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockState {
    pub is_locked: bool,
    pub held_by: String,
    /// This client's own identity, persisted outside this core.
    pub identity: String,
}

impl LockState {
    /// Another client holds the lock. UI action gates consult this
    /// before issuing rotor commands; it is advisory only.
    pub fn is_locked_by_else(&self) -> bool {
        self.is_locked && self.held_by != self.identity
    }
}

pub struct LockStore {
    slice: Slice<LockState>,
    outbound: crate::outbound::Outbound,
    persist: Arc<dyn KeyValueStore>,
}

impl LockStore {
    pub fn new(outbound: crate::outbound::Outbound, persist: Arc<dyn KeyValueStore>) -> Self {
        let identity = persist.get(IDENTITY_KEY).unwrap_or_default();
        Self {
            slice: Slice::new(LockState { identity, ..LockState::default() }),
            outbound,
            persist,
        }
    }

    pub fn get(&self) -> LockState {
        self.slice.get()
    }

    pub fn version(&self) -> u64 {
        self.slice.version()
    }

    pub fn subscribe(&self, listener: impl Fn(&LockState) + Send + Sync + 'static) {
        self.slice.subscribe(listener);
    }

    pub fn is_locked_by_else(&self) -> bool {
        self.slice.read(LockState::is_locked_by_else)
    }

    pub fn set_identity(&self, identity: &str) {
        self.persist.set(IDENTITY_KEY, identity);
        self.slice.update(|state| state.identity = identity.to_string());
    }

    /// Claim the lock for this client and broadcast the claim.
    pub fn close_lock(&self) {
        let msg = self.slice.update(|state| {
            state.is_locked = true;
            state.held_by = state.identity.clone();
            LockMsg { is_locked: true, by: state.held_by.clone() }
        });
        self.outbound.send_lock(&msg);
    }

    /// Release the lock. Takes effect locally at once, without waiting
    /// for the controller's echo.
    pub fn open_lock(&self) {
        self.slice.update(|state| {
            state.is_locked = false;
            state.held_by.clear();
        });
        self.outbound.send_lock(&LockMsg::default());
    }

    /// Release the lock and forget this client's identity, both in the
    /// slice and in the external persistence collaborator.
    pub fn reset_lock(&self) {
        self.persist.remove(IDENTITY_KEY);
        self.slice.update(|state| {
            state.is_locked = false;
            state.held_by.clear();
            state.identity.clear();
        });
        self.outbound.send_lock(&LockMsg::default());
    }

    pub(crate) fn merge_remote(&self, fields: &Map<String, Value>) {
        self.slice.update(|state| {
            for (key, value) in fields {
                match key.as_str() {
                    "isLocked" => apply("lock", key, value.as_bool(), &mut state.is_locked),
                    "by" => apply(
                        "lock",
                        key,
                        value.as_str().map(str::to_string),
                        &mut state.held_by,
                    ),
                    _ => warn!(key, "unknown lock field"),
                }
            }
        });
    }
}
