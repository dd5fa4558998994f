//! credo-core - OAuth credential lifecycle.
//!
//! This crate owns the access/refresh token pair of a single signed-in user:
//!
//! - [`CredentialStore`] persists the current [`CredentialSet`]
//! - [`RefreshCoordinator`] decides when a token is stale and refreshes it,
//!   collapsing concurrent demand into a single exchange
//! - [`RequestGateway`] wraps every authenticated call, attaching a fresh token
//!   and replaying once after an authentication rejection
//!
//! Transports live in sibling crates: `credo-file` for durable storage and
//! `credo-http` for the token endpoint and the chat webhook.

pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod gateway;
pub mod memory;
pub mod refresh;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::CoordinatorConfig;
pub use credentials::{CredentialSet, TokenGrant};
pub use error::Error;
pub use events::SessionEvent;
pub use gateway::{CallPhase, RequestGateway};
pub use memory::MemoryCredentialStore;
pub use refresh::{RefreshCoordinator, SessionStatus};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{CredentialStore, TokenExchange};
pub use types::{ServiceUrl, UserId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
