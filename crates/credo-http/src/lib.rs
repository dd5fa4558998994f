//! credo-http - HTTP collaborators for credo.
//!
//! - [`HttpTokenExchange`] implements the refresh exchange against the token
//!   backend
//! - [`AuthedClient`] sends bearer-authenticated requests through a
//!   [`RequestGateway`](credo_core::RequestGateway)
//! - [`WebhookClient`] posts chat messages to the automation webhook
//! - [`BackendClient`] registers grants with the token backend and checks
//!   their validity

mod authed;
mod backend;
mod client;
pub mod endpoints;
mod exchange;
mod webhook;

pub use authed::AuthedClient;
pub use backend::{BackendClient, SignInProfile, TokenValidation};
pub use client::HttpClient;
pub use exchange::HttpTokenExchange;
pub use webhook::{ChatReply, NO_RESPONSE, WebhookClient};
