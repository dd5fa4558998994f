//! JSON-over-HTTP client shared by every collaborator.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use credo_core::error::{ProtocolError, TransportError};
use credo_core::{AccessToken, Error, Result};

use crate::endpoints::ErrorResponse;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classify a reqwest failure as a transport error.
///
/// Connection and timeout failures are transient; anything else (a body that
/// does not decode, a redirect loop) is reported as [`TransportError::Http`].
fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    transport.into()
}

/// HTTP client for JSON requests.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("credo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// POST a JSON body without credentials.
    #[instrument(skip(self, body))]
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response).await
    }

    /// POST a JSON body with the access token as bearer credential.
    #[instrument(skip(self, body, token))]
    pub async fn post_json_authed<B, R>(&self, url: &str, body: &B, token: &AccessToken) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST (authenticated)");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response).await
    }

    /// POST with query parameters and no body.
    #[instrument(skip(self, params))]
    pub async fn post_query<Q, R>(&self, url: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST (query)");
        trace!(?params, "query parameters");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response).await
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        transport_error(err, self.timeout)
    }

    /// Handle a response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "response");

        if status.is_success() {
            response.json::<R>().await.map_err(|e| self.transport_error(e))
        } else {
            Err(Error::Protocol(parse_error_response(response).await))
        }
    }
}

/// Parse an error response, tolerating bodies that are not JSON.
async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(body) => {
            let error = body.error.clone();
            ProtocolError::new(status, error, body.into_message())
        }
        Err(_) => ProtocolError::new(status, None, None),
    }
}
