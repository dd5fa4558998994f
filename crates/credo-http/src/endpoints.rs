//! Backend endpoint paths and request/response types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange a refresh token for a new access token.
pub const REFRESH_TOKEN: &str = "/api/auth/refresh-token";

/// Register a sign-in grant with the backend.
pub const STORE_TOKEN: &str = "/api/auth/store-token";

/// Ask the backend whether it holds a valid token for a user.
pub const VALIDATE_TOKEN: &str = "/api/auth/validate-token";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the refresh exchange.
#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub user_id: &'a str,
    pub refresh_token: &'a str,
}

/// Response from the refresh exchange.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    #[serde(deserialize_with = "deserialize_expiry")]
    pub expires_at: DateTime<Utc>,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Read an expiry as RFC 3339, or as an ISO 8601 timestamp without offset,
/// which the backend means as UTC.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(at.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| serde::de::Error::custom(format!("invalid expiry timestamp: {raw:?}")))
}

/// Request body for store-token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTokenRequest<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<&'a str>,
    pub access_token: &'a str,
    pub refresh_token: Option<&'a str>,
    pub expires_at: String,
    pub scopes: &'a [String],
}

/// Response from store-token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTokenResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Query parameters for validate-token.
#[derive(Debug, Serialize)]
pub struct ValidateTokenParams<'a> {
    pub user_id: &'a str,
}

/// Response from validate-token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for the chat webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub action: &'static str,
    pub chat_input: &'a str,
}

/// Error body returned by the backend or webhook.
///
/// Accepts both `{"error", "message"}` and the `{"detail"}` shape used by the
/// token backend.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// The human-readable message, preferring `message` over `detail`.
    pub fn into_message(self) -> Option<String> {
        self.message.or_else(|| match self.detail? {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn refresh_response_parses_rfc3339() {
        let response: RefreshTokenResponse = serde_json::from_value(json!({
            "accessToken": "at",
            "expiresAt": "2030-01-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(response.access_token, "at");
        assert_eq!(response.expires_at.to_rfc3339(), "2030-01-01T12:00:00+00:00");
        assert!(response.refresh_token.is_none());
    }

    #[test]
    fn refresh_response_reads_naive_expiry_as_utc() {
        let response: RefreshTokenResponse = serde_json::from_value(json!({
            "accessToken": "at",
            "expiresAt": "2030-01-01T12:00:00.123456"
        }))
        .unwrap();

        assert_eq!(
            response.expires_at.to_rfc3339(),
            "2030-01-01T12:00:00.123456+00:00"
        );

        let whole_seconds: RefreshTokenResponse = serde_json::from_value(json!({
            "accessToken": "at",
            "expiresAt": "2030-01-01T12:00:00"
        }))
        .unwrap();
        assert_eq!(whole_seconds.expires_at.to_rfc3339(), "2030-01-01T12:00:00+00:00");
    }

    #[test]
    fn refresh_response_keeps_offset() {
        let response: RefreshTokenResponse = serde_json::from_value(json!({
            "accessToken": "at",
            "expiresAt": "2030-01-01T14:00:00+02:00"
        }))
        .unwrap();

        assert_eq!(response.expires_at.to_rfc3339(), "2030-01-01T12:00:00+00:00");
    }

    #[test]
    fn refresh_response_rejects_garbage_expiry() {
        let result = serde_json::from_value::<RefreshTokenResponse>(json!({
            "accessToken": "at",
            "expiresAt": "next tuesday"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn store_token_uses_backend_field_names() {
        let scopes = vec!["email".to_string()];
        let body = serde_json::to_value(StoreTokenRequest {
            user_id: "u",
            email: "u@example.com",
            display_name: "U",
            photo_url: None,
            access_token: "at",
            refresh_token: Some("rt"),
            expires_at: "2030-01-01T12:00:00+00:00".to_string(),
            scopes: &scopes,
        })
        .unwrap();

        assert_eq!(body["userId"], "u");
        assert_eq!(body["displayName"], "U");
        assert!(body["photoURL"].is_null());
        assert_eq!(body["refreshToken"], "rt");
        assert_eq!(body["scopes"], json!(["email"]));
    }

    #[test]
    fn error_detail_becomes_message() {
        let err: ErrorResponse =
            serde_json::from_value(json!({"detail": "Error storing token"})).unwrap();
        assert_eq!(err.into_message().as_deref(), Some("Error storing token"));

        let err: ErrorResponse =
            serde_json::from_value(json!({"error": "ExpiredToken", "message": "expired"})).unwrap();
        assert_eq!(err.error.as_deref(), Some("ExpiredToken"));
        assert_eq!(err.into_message().as_deref(), Some("expired"));
    }
}
