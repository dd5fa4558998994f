//! Refresh exchange against the token backend.

use async_trait::async_trait;
use tracing::{debug, instrument};

use credo_core::error::ProtocolError;
use credo_core::{AccessToken, RefreshToken, Result, ServiceUrl, TokenExchange, TokenGrant, UserId};

use crate::client::HttpClient;
use crate::endpoints::{REFRESH_TOKEN, RefreshTokenRequest, RefreshTokenResponse};

/// [`TokenExchange`] posting the refresh token to the backend.
///
/// A non-success response surfaces as [`credo_core::Error::Protocol`], which
/// the coordinator treats as a refresh failure. A response without an access
/// token is treated the same way.
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    http: HttpClient,
    backend: ServiceUrl,
}

impl HttpTokenExchange {
    pub fn new(http: HttpClient, backend: ServiceUrl) -> Self {
        Self { http, backend }
    }

    /// Returns the backend this exchange talks to.
    pub fn backend(&self) -> &ServiceUrl {
        &self.backend
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    #[instrument(skip(self, refresh_token), fields(backend = %self.backend))]
    async fn refresh(&self, user_id: &UserId, refresh_token: &RefreshToken) -> Result<TokenGrant> {
        let request = RefreshTokenRequest {
            user_id: user_id.as_str(),
            refresh_token: refresh_token.as_str(),
        };

        let response: RefreshTokenResponse = self
            .http
            .post_json(&self.backend.endpoint(REFRESH_TOKEN), &request)
            .await?;

        if response.access_token.is_empty() {
            return Err(ProtocolError::new(
                200,
                Some("InvalidResponse".to_string()),
                Some("refresh response carried an empty access token".to_string()),
            )
            .into());
        }

        debug!(expires_at = %response.expires_at, rotated = response.refresh_token.is_some(), "Refresh exchange succeeded");

        let grant = TokenGrant::new(AccessToken::new(response.access_token), response.expires_at);
        Ok(match response.refresh_token.filter(|t| !t.is_empty()) {
            Some(rotated) => grant.with_refresh_token(RefreshToken::new(rotated)),
            None => grant,
        })
    }
}
