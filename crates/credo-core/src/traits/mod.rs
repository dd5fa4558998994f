//! Seams between the credential lifecycle and its collaborators.

mod exchange;
mod store;

pub use exchange::TokenExchange;
pub use store::CredentialStore;
