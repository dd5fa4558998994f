//! Credential store trait.

use crate::{CredentialSet, Result};

/// Durable holder of the current credential set.
///
/// A store holds at most one set. Implementations treat tokens as opaque
/// strings and perform no validation of their content. Store I/O is
/// synchronous; it is expected to be fast enough to call from async code.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted set.
    ///
    /// Returns `Ok(None)` when nothing is persisted or the persisted data is
    /// malformed. Malformed data is never partially used.
    fn load(&self) -> Result<Option<CredentialSet>>;

    /// Atomically replace the persisted set.
    fn save(&self, set: &CredentialSet) -> Result<()>;

    /// Remove the persisted set. Idempotent.
    fn clear(&self) -> Result<()>;
}
