//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::Notify;

use crate::error::{ProtocolError, TransportError};
use crate::traits::{CredentialStore, TokenExchange};
use crate::types::UserId;
use crate::{
    AccessToken, CoordinatorConfig, CredentialSet, RefreshCoordinator, RefreshToken, Result,
    TokenGrant,
};

/// How the mock token endpoint answers.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    /// Issue `access-<n>` valid for the given duration.
    Grant(TimeDelta),
    /// Reject the refresh token.
    Reject,
    /// Fail to connect.
    Offline,
}

pub(crate) struct MockExchange {
    pub calls: AtomicUsize,
    reply: Reply,
    delay: Option<Duration>,
    gate: Option<Notify>,
    pub entered: Notify,
}

impl MockExchange {
    pub fn new(reply: Reply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
            delay: None,
            gate: None,
            entered: Notify::new(),
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every exchange until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for MockExchange {
    async fn refresh(&self, _user_id: &UserId, _refresh_token: &RefreshToken) -> Result<TokenGrant> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.reply {
            Reply::Grant(lifetime) => Ok(TokenGrant::new(
                AccessToken::new(format!("access-{}", n)),
                Utc::now() + lifetime,
            )),
            Reply::Reject => Err(ProtocolError::new(
                401,
                Some("invalid_grant".to_string()),
                Some("refresh token revoked".to_string()),
            )
            .into()),
            Reply::Offline => Err(TransportError::Connection {
                message: "connection refused".to_string(),
            }
            .into()),
        }
    }
}

/// Credentials for `user-1` expiring `lifetime` from now.
pub(crate) fn credentials_expiring_in(lifetime: TimeDelta) -> CredentialSet {
    CredentialSet::new(
        UserId::new("user-1").unwrap(),
        TokenGrant::new(AccessToken::new("initial-access"), Utc::now() + lifetime),
        Some(RefreshToken::new("initial-refresh")),
    )
}

pub(crate) fn coordinator_with(
    store: Arc<dyn CredentialStore>,
    exchange: Arc<MockExchange>,
) -> RefreshCoordinator {
    RefreshCoordinator::new(store, exchange, CoordinatorConfig::default())
}
