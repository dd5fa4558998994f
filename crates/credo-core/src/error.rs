//! Error types for credo.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage, and input validation errors.
//!
//! Every error is `Clone`: a single refresh outcome is delivered to every
//! caller waiting on it.

use std::fmt;
use thiserror::Error;

/// The unified error type for credo operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (no session, expired session, rejected credential).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-success responses from a remote collaborator).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Credential store errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (invalid URL, user id).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A background task failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if a remote collaborator rejected the presented credential.
    ///
    /// This is the only condition under which the request gateway refreshes
    /// and replays a call.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Error::Protocol(err) if err.is_auth_error())
    }

    /// Check if the network could not be reached at all.
    ///
    /// Transient failures never end a session; the caller owns any retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport(
                TransportError::Connection { .. }
                    | TransportError::Dns { .. }
                    | TransportError::Tls { .. }
                    | TransportError::Timeout { .. }
            )
        )
    }

    /// Check if recovering from this error requires a fresh sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Error::Auth(
                AuthError::Unauthenticated
                    | AuthError::SessionExpired
                    | AuthError::CredentialRejected
            )
        )
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// DNS resolution failed.
    #[error("DNS resolution failed: {host}")]
    Dns { host: String },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error (malformed body, redirect loop, builder failure).
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential has been established.
    #[error("not signed in")]
    Unauthenticated,

    /// The refresh exchange failed; the stored credential was discarded.
    #[error("session expired")]
    SessionExpired,

    /// The remote collaborator rejected the credential even after a refresh.
    #[error("credential rejected after refresh")]
    CredentialRejected,

    /// A different identity is already signed in.
    #[error("user '{established}' is signed in; sign out before establishing '{attempted}'")]
    UserMismatch {
        established: String,
        attempted: String,
    },
}

/// Protocol-level errors from remote responses.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
            || self.error.as_deref() == Some("AuthenticationRequired")
            || self.error.as_deref() == Some("ExpiredToken")
            || self.error.as_deref() == Some("InvalidToken")
    }
}

/// Credential store errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The cross-process lock could not be acquired.
    #[error("failed to lock {path}: {message}")]
    Lock { path: String, message: String },

    /// The credential set could not be serialized.
    #[error("failed to encode credentials: {message}")]
    Encode { message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid service URL.
    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },

    /// Invalid user identifier.
    #[error("invalid user id '{value}': {reason}")]
    UserId { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_status_is_auth_rejection() {
        let err = Error::Protocol(ProtocolError::new(401, None, None));
        assert!(err.is_auth_rejection());
        assert!(!err.is_transient());
    }

    #[test]
    fn expired_token_code_is_auth_rejection() {
        let err = Error::Protocol(ProtocolError::new(
            400,
            Some("ExpiredToken".to_string()),
            None,
        ));
        assert!(err.is_auth_rejection());
    }

    #[test]
    fn server_error_passes_through() {
        let err = Error::Protocol(ProtocolError::new(503, None, Some("down".into())));
        assert!(!err.is_auth_rejection());
        assert!(!err.requires_sign_in());
        assert_eq!(err.to_string(), "protocol error: HTTP 503: down");
    }

    #[test]
    fn connection_failure_is_transient() {
        let err = Error::Transport(TransportError::Connection {
            message: "refused".into(),
        });
        assert!(err.is_transient());

        let err = Error::Transport(TransportError::Http {
            message: "bad body".into(),
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn session_errors_require_sign_in() {
        assert!(Error::from(AuthError::SessionExpired).requires_sign_in());
        assert!(Error::from(AuthError::Unauthenticated).requires_sign_in());
    }
}
