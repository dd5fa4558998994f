//! Token backend client: grant registration and validity checks.

use tracing::{info, instrument, warn};

use credo_core::error::ProtocolError;
use credo_core::{CredentialSet, Result, ServiceUrl, UserId};

use crate::client::HttpClient;
use crate::endpoints::{
    STORE_TOKEN, StoreTokenRequest, StoreTokenResponse, VALIDATE_TOKEN, ValidateTokenParams,
    ValidateTokenResponse,
};

/// Profile details reported by the identity provider at sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInProfile {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub scopes: Vec<String>,
}

impl SignInProfile {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

/// The backend's view of a user's stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValidation {
    pub valid: bool,
    pub message: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Client for the token backend's bookkeeping endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: HttpClient,
    backend: ServiceUrl,
}

impl BackendClient {
    pub fn new(http: HttpClient, backend: ServiceUrl) -> Self {
        Self { http, backend }
    }

    /// Register a freshly established credential set with the backend.
    ///
    /// Callers treat a failure as non-fatal: sign-in has already completed
    /// locally.
    #[instrument(skip(self, set, profile), fields(backend = %self.backend, user_id = %set.user_id()))]
    pub async fn register(&self, set: &CredentialSet, profile: &SignInProfile) -> Result<()> {
        let request = StoreTokenRequest {
            user_id: set.user_id().as_str(),
            email: &profile.email,
            display_name: &profile.display_name,
            photo_url: profile.photo_url.as_deref(),
            access_token: set.access_token().as_str(),
            refresh_token: set.refresh_token().map(|t| t.as_str()),
            expires_at: set.expires_at().to_rfc3339(),
            scopes: &profile.scopes,
        };

        let response: StoreTokenResponse = self
            .http
            .post_json(&self.backend.endpoint(STORE_TOKEN), &request)
            .await?;

        if !response.success {
            warn!(message = %response.message, "Backend declined to store the token");
            return Err(ProtocolError::new(
                200,
                Some("StoreTokenFailed".to_string()),
                Some(response.message),
            )
            .into());
        }

        info!(message = %response.message, "Registered token with backend");
        Ok(())
    }

    /// Ask whether the backend holds an unexpired token for `user_id`.
    #[instrument(skip(self), fields(backend = %self.backend))]
    pub async fn validate_token(&self, user_id: &UserId) -> Result<TokenValidation> {
        let params = ValidateTokenParams {
            user_id: user_id.as_str(),
        };

        let response: ValidateTokenResponse = self
            .http
            .post_query(&self.backend.endpoint(VALIDATE_TOKEN), &params)
            .await?;

        Ok(TokenValidation {
            valid: response.valid,
            message: response.message,
            email: response.email,
            display_name: response.display_name,
        })
    }
}
