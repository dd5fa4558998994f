//! In-process credential store.

use std::sync::RwLock;

use crate::traits::CredentialStore;
use crate::{CredentialSet, Result};

/// A credential store that lives only as long as the process.
///
/// Used for ephemeral sessions and as the default store in tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    current: RwLock<Option<CredentialSet>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `set`.
    pub fn with_credentials(set: CredentialSet) -> Self {
        Self {
            current: RwLock::new(Some(set)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<CredentialSet>> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Ok(current.clone())
    }

    fn save(&self, set: &CredentialSet) -> Result<()> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(set.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessToken, RefreshToken, TokenGrant, UserId};
    use chrono::{TimeDelta, Utc};

    fn sample() -> CredentialSet {
        CredentialSet::new(
            UserId::new("user-1").unwrap(),
            TokenGrant::new(AccessToken::new("a"), Utc::now() + TimeDelta::hours(1)),
            Some(RefreshToken::new("r")),
        )
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        let set = sample();
        store.save(&set).unwrap();
        assert_eq!(store.load().unwrap(), Some(set));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = MemoryCredentialStore::with_credentials(sample());
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
