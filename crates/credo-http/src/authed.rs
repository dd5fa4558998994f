//! Bearer-authenticated requests routed through the gateway.

use serde::{Serialize, de::DeserializeOwned};

use credo_core::{RequestGateway, Result};

use crate::client::HttpClient;

/// An [`HttpClient`] whose requests always carry a fresh access token.
///
/// Every request goes through [`RequestGateway::execute`], so a stale token is
/// refreshed before dispatch and a 401 triggers one refresh and replay.
#[derive(Debug, Clone)]
pub struct AuthedClient {
    http: HttpClient,
    gateway: RequestGateway,
}

impl AuthedClient {
    pub fn new(http: HttpClient, gateway: RequestGateway) -> Self {
        Self { http, gateway }
    }

    /// Returns the gateway supplying tokens.
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// POST a JSON body with the current access token.
    pub async fn post_json<B, R>(&self, label: &str, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let http = &self.http;
        self.gateway
            .execute(label, |token| async move { http.post_json_authed(url, body, &token).await })
            .await
    }
}
