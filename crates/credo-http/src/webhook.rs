//! Chat webhook client.

use serde_json::Value;
use tracing::{debug, instrument};

use credo_core::error::InvalidInputError;
use credo_core::{Result, ServiceUrl};

use crate::authed::AuthedClient;
use crate::endpoints::ChatRequest;

/// Reply text used when the webhook answers without an `output`.
pub const NO_RESPONSE: &str = "No response from AI";

/// Reply from the chat webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub output: String,
}

/// Client for the chat automation webhook.
///
/// # Example
///
/// ```no_run
/// use credo_core::ServiceUrl;
/// use credo_http::{AuthedClient, WebhookClient};
///
/// # async fn example(authed: AuthedClient) -> Result<(), credo_core::Error> {
/// let webhook = WebhookClient::new(authed, ServiceUrl::new("https://hooks.example.com/chat")?);
/// let reply = webhook.send_message("session-1", "hello").await?;
/// println!("{}", reply.output);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebhookClient {
    authed: AuthedClient,
    url: ServiceUrl,
}

impl WebhookClient {
    pub fn new(authed: AuthedClient, url: ServiceUrl) -> Self {
        Self { authed, url }
    }

    /// Send one chat message and return the reply.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] for an empty session id or message, and
    /// any gateway error otherwise.
    #[instrument(skip(self, chat_input), fields(url = %self.url))]
    pub async fn send_message(&self, session_id: &str, chat_input: &str) -> Result<ChatReply> {
        if session_id.trim().is_empty() {
            return Err(InvalidInputError::Other {
                message: "session id cannot be empty".to_string(),
            }
            .into());
        }
        if chat_input.trim().is_empty() {
            return Err(InvalidInputError::Other {
                message: "message cannot be empty".to_string(),
            }
            .into());
        }

        let request = ChatRequest {
            session_id,
            action: "sendMessage",
            chat_input,
        };

        let body: Value = self
            .authed
            .post_json("webhook.sendMessage", self.url.as_str(), &request)
            .await?;

        let output = reply_output(&body).unwrap_or(NO_RESPONSE).to_string();
        debug!(len = output.len(), "Received chat reply");
        Ok(ChatReply { output })
    }
}

/// Extract a non-empty `output` string from an object or a one-item array.
fn reply_output(body: &Value) -> Option<&str> {
    let object = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    object
        .get("output")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
