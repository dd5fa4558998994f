//! Session lifecycle events.

use chrono::{DateTime, Utc};

use crate::types::UserId;

/// Lifecycle transitions broadcast by the refresh coordinator.
///
/// The application shell subscribes to these to learn when it must force a
/// fresh sign-in ([`SessionEvent::Expired`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential set was established by sign-in.
    Established { user_id: UserId },
    /// The access token was renewed.
    Refreshed {
        user_id: UserId,
        expires_at: DateTime<Utc>,
    },
    /// The refresh exchange failed and the credentials were discarded.
    Expired { user_id: UserId },
    /// The user signed out.
    SignedOut,
}
