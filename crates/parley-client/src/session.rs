//! Session identity resolution.
//!
//! The caller's bearer credential lives in one of a small set of named
//! storage slots owned by the host environment. Resolution walks the
//! slots in order and returns the first non-empty value; it has no side
//! effects and never caches. Absence is not an error at this layer —
//! callers decide whether a missing identity is fatal.

use std::collections::HashMap;

use parley_shared::constants::TOKEN_SLOTS;
use parley_shared::error::{ChatError, Result};
use parley_shared::types::Credential;

/// Named-slot storage the credential is resolved from.
pub trait CredentialStore: Send + Sync {
    /// Read the raw value of a storage slot, if present.
    fn get(&self, slot: &str) -> Option<String>;
}

/// Credential store backed by process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl CredentialStore for EnvCredentialStore {
    fn get(&self, slot: &str) -> Option<String> {
        std::env::var(slot).ok()
    }
}

/// In-memory credential store, for tests and embedding hosts that manage
/// their own session storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    slots: HashMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(slot.into(), value.into());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, slot: &str) -> Option<String> {
        self.slots.get(slot).cloned()
    }
}

/// Resolve the session credential from the ordered slot list.
///
/// Returns the first non-empty (after trimming) value, or `None` when no
/// slot holds one.
pub fn resolve_credential(store: &dyn CredentialStore) -> Option<Credential> {
    for slot in TOKEN_SLOTS {
        if let Some(value) = store.get(slot) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(Credential::new(trimmed));
            }
        }
    }
    None
}

/// Resolve the session credential, failing with `IdentityMissing` when
/// none is available. Used by operations that require identity.
pub fn require_credential(store: &dyn CredentialStore) -> Result<Credential> {
    resolve_credential(store).ok_or(ChatError::IdentityMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_slot_wins() {
        let mut store = MemoryCredentialStore::new();
        store.set("access_token", "primary");
        store.set("token", "secondary");

        let cred = resolve_credential(&store).unwrap();
        assert_eq!(cred.reveal(), "primary");
    }

    #[test]
    fn test_falls_through_empty_slots() {
        let mut store = MemoryCredentialStore::new();
        store.set("access_token", "   ");
        store.set("token", "fallback");

        let cred = resolve_credential(&store).unwrap();
        assert_eq!(cred.reveal(), "fallback");
    }

    #[test]
    fn test_absence_is_not_an_error() {
        let store = MemoryCredentialStore::new();
        assert!(resolve_credential(&store).is_none());

        assert!(matches!(
            require_credential(&store),
            Err(ChatError::IdentityMissing)
        ));
    }

    #[test]
    fn test_value_is_trimmed() {
        let mut store = MemoryCredentialStore::new();
        store.set("access_token", "  tok-123  ");

        let cred = resolve_credential(&store).unwrap();
        assert_eq!(cred.reveal(), "tok-123");
    }
}
