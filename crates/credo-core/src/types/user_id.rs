//! Stable user identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// An opaque, stable identifier for the signed-in user.
///
/// The identity provider issues the value (for example a Firebase `uid`);
/// credo only requires it to be non-empty and free of whitespace and control
/// characters so it can travel in JSON bodies and query strings untouched.
///
/// # Example
///
/// ```
/// use credo_core::UserId;
///
/// let user = UserId::new("kX3v9QbT1mPq").unwrap();
/// assert_eq!(user.as_str(), "kX3v9QbT1mPq");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new user id, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or contains whitespace or
    /// control characters.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::UserId {
                value: s.to_string(),
                reason: "must be non-empty".to_string(),
            }
            .into());
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidInputError::UserId {
                value: s.escape_debug().to_string(),
                reason: "must not contain whitespace or control characters".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(user: UserId) -> Self {
        user.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_provider_uid() {
        let user = UserId::new("Xq2bLr8WzNfT0aYc3hJ9").unwrap();
        assert_eq!(user.to_string(), "Xq2bLr8WzNfT0aYc3hJ9");
    }

    #[test]
    fn rejects_empty() {
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(UserId::new("alice smith").is_err());
        assert!(UserId::new("alice\n").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<UserId, _> = serde_json::from_str("\"u-1\"");
        assert!(ok.is_ok());
        let bad: Result<UserId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
