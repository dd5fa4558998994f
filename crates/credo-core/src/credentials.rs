//! The credential set held for the signed-in user.

use chrono::{DateTime, TimeDelta, Utc};

use crate::tokens::{AccessToken, RefreshToken};
use crate::types::UserId;

/// A freshly issued access token together with its expiry.
///
/// An access token never exists without its expiry: both travel in one value
/// from the identity provider (or the refresh exchange) into the credential
/// set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// The new bearer credential.
    pub access_token: AccessToken,
    /// Absolute instant after which `access_token` is no longer valid.
    pub expires_at: DateTime<Utc>,
    /// A rotated refresh token, if the provider issued one.
    pub refresh_token: Option<RefreshToken>,
}

impl TokenGrant {
    /// Create a grant without refresh token rotation.
    pub fn new(access_token: AccessToken, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expires_at,
            refresh_token: None,
        }
    }

    /// Attach a rotated refresh token.
    pub fn with_refresh_token(mut self, refresh_token: RefreshToken) -> Self {
        self.refresh_token = Some(refresh_token);
        self
    }
}

/// The credentials of the single signed-in identity.
///
/// # Security
///
/// Both tokens redact themselves in Debug output, so the set can be logged
/// with `?` without exposing secrets.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use credo_core::{AccessToken, CredentialSet, TokenGrant, UserId};
///
/// let grant = TokenGrant::new(AccessToken::new("at"), Utc::now() + TimeDelta::hours(1));
/// let set = CredentialSet::new(UserId::new("u-1").unwrap(), grant, None);
/// assert!(!set.is_near_expiry(Utc::now(), TimeDelta::minutes(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    user_id: UserId,
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    expires_at: DateTime<Utc>,
}

impl CredentialSet {
    /// Create a credential set from a sign-in grant.
    ///
    /// A refresh token carried by the grant takes precedence over
    /// `refresh_token`.
    pub fn new(user_id: UserId, grant: TokenGrant, refresh_token: Option<RefreshToken>) -> Self {
        Self {
            user_id,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or(refresh_token),
            expires_at: grant.expires_at,
        }
    }

    /// Returns a copy with the access token and expiry replaced by `grant`.
    ///
    /// The user id is carried over unchanged; the refresh token is replaced
    /// only if the provider rotated it.
    pub fn with_grant(&self, grant: TokenGrant) -> Self {
        Self {
            user_id: self.user_id.clone(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at: grant.expires_at,
        }
    }

    /// Returns the user this set belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the current bearer credential.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the refresh token, if the provider issued one.
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Returns the expiry of the access token.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true once `now` is within `buffer` of the expiry.
    pub fn is_near_expiry(&self, now: DateTime<Utc>, buffer: TimeDelta) -> bool {
        match self.expires_at.checked_sub_signed(buffer) {
            Some(threshold) => now >= threshold,
            None => true,
        }
    }

    /// Returns the time left before expiry (negative once expired).
    pub fn expires_in(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at.signed_duration_since(now)
    }
}
