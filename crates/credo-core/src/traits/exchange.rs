//! Refresh exchange trait.

use async_trait::async_trait;

use crate::types::UserId;
use crate::{RefreshToken, Result, TokenGrant};

/// The identity/token endpoint that extends a session.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Trade a refresh token for a new access token and expiry.
    ///
    /// Any non-success response must be reported as an error other than a
    /// transient transport failure; the coordinator treats those as the end
    /// of the session.
    async fn refresh(&self, user_id: &UserId, refresh_token: &RefreshToken) -> Result<TokenGrant>;
}
