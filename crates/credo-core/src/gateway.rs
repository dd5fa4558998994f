//! Authenticated request gateway.

use std::fmt;
use std::future::Future;

use tracing::{debug, instrument, trace, warn};

use crate::error::AuthError;
use crate::refresh::RefreshCoordinator;
use crate::{AccessToken, Result};

/// Where a logical call is in its lifecycle.
///
/// `Pending → Dispatched → Refreshing → Retried → {Succeeded | Failed}`, or
/// `Pending → Failed` when no usable credential could be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Pending,
    Dispatched,
    Refreshing,
    Retried,
    Succeeded,
    Failed,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallPhase::Pending => "pending",
            CallPhase::Dispatched => "dispatched",
            CallPhase::Refreshing => "refreshing",
            CallPhase::Retried => "retried",
            CallPhase::Succeeded => "succeeded",
            CallPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The single path for outbound calls that need the bearer credential.
///
/// Before dispatch the gateway obtains a fresh token from the
/// [`RefreshCoordinator`]; after dispatch it replays a call exactly once if
/// the remote side rejected the credential.
///
/// # Example
///
/// ```no_run
/// use credo_core::{RefreshCoordinator, RequestGateway};
///
/// # async fn example(coordinator: RefreshCoordinator) -> Result<(), credo_core::Error> {
/// let gateway = RequestGateway::new(coordinator);
/// let len = gateway
///     .execute("token-length", |token| async move { Ok(token.as_str().len()) })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestGateway {
    coordinator: RefreshCoordinator,
}

impl RequestGateway {
    /// Create a gateway drawing tokens from `coordinator`.
    pub fn new(coordinator: RefreshCoordinator) -> Self {
        Self { coordinator }
    }

    /// Returns the coordinator backing this gateway.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Run `call` with a fresh access token.
    ///
    /// `call` attaches the token to its transport and reports an
    /// authentication rejection as an error for which
    /// [`Error::is_auth_rejection`](crate::Error::is_auth_rejection) holds.
    /// It is invoked at most twice.
    ///
    /// # Errors
    ///
    /// - pre-flight: any error of [`RefreshCoordinator::ensure_fresh`]; `call`
    ///   is not invoked
    /// - [`AuthError::CredentialRejected`] if the replay is rejected as well
    /// - any other error of `call`, unchanged
    #[instrument(skip(self, call))]
    pub async fn execute<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T>
    where
        F: FnMut(AccessToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        trace!(phase = %CallPhase::Pending);

        let token = self.coordinator.ensure_fresh().await.inspect_err(|err| {
            debug!(phase = %CallPhase::Failed, error = %err, "No usable credential");
        })?;

        trace!(phase = %CallPhase::Dispatched);
        let rejection = match call(token.clone()).await {
            Err(err) if err.is_auth_rejection() => err,
            outcome => return outcome,
        };

        warn!(phase = %CallPhase::Refreshing, error = %rejection, "Credential rejected, refreshing");
        let token = self
            .coordinator
            .refresh_after_rejection(&token)
            .await
            .inspect_err(|err| {
                debug!(phase = %CallPhase::Failed, error = %err, "Refresh after rejection failed");
            })?;

        trace!(phase = %CallPhase::Retried);
        match call(token).await {
            Err(err) if err.is_auth_rejection() => {
                warn!(phase = %CallPhase::Failed, error = %err, "Credential rejected again");
                Err(AuthError::CredentialRejected.into())
            }
            outcome => {
                trace!(phase = %CallPhase::Succeeded, ok = outcome.is_ok());
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeDelta;

    use super::*;
    use crate::error::{Error, ProtocolError};
    use crate::test_support::{MockExchange, Reply, coordinator_with, credentials_expiring_in};
    use crate::{CredentialStore, MemoryCredentialStore};

    fn gateway(lifetime: TimeDelta, reply: Reply) -> (RequestGateway, Arc<MockExchange>) {
        let exchange = Arc::new(MockExchange::new(reply));
        let store = Arc::new(MemoryCredentialStore::with_credentials(
            credentials_expiring_in(lifetime),
        ));
        let gateway = RequestGateway::new(coordinator_with(store, exchange.clone()));
        (gateway, exchange)
    }

    fn unauthorized() -> Error {
        ProtocolError::new(401, None, Some("Unauthorized".to_string())).into()
    }

    #[tokio::test]
    async fn attaches_current_token() {
        let (gateway, exchange) = gateway(TimeDelta::minutes(30), Reply::Grant(TimeDelta::hours(1)));

        let seen = gateway
            .execute("echo", |token| async move { Ok(token.as_str().to_string()) })
            .await
            .unwrap();

        assert_eq!(seen, "initial-access");
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn refreshes_before_dispatch_when_stale() {
        let (gateway, exchange) = gateway(TimeDelta::minutes(2), Reply::Grant(TimeDelta::hours(1)));

        let seen = gateway
            .execute("echo", |token| async move { Ok(token.as_str().to_string()) })
            .await
            .unwrap();

        assert_eq!(seen, "access-1");
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn retries_once_after_rejection() {
        let (gateway, exchange) = gateway(TimeDelta::minutes(30), Reply::Grant(TimeDelta::hours(1)));
        let attempts = AtomicUsize::new(0);

        let reply = gateway
            .execute("chat", |token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if token.as_str() == "initial-access" {
                        Err(unauthorized())
                    } else {
                        Ok(format!("served with {}", token.as_str()))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(reply, "served with access-1");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn second_rejection_is_terminal() {
        let (gateway, exchange) = gateway(TimeDelta::minutes(30), Reply::Grant(TimeDelta::hours(1)));
        let attempts = AtomicUsize::new(0);

        let err = gateway
            .execute("chat", |_token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(unauthorized()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::CredentialRejected)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn other_failures_pass_through_without_retry() {
        let (gateway, exchange) = gateway(TimeDelta::minutes(30), Reply::Grant(TimeDelta::hours(1)));
        let attempts = AtomicUsize::new(0);

        let err = gateway
            .execute("chat", |_token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ProtocolError::new(502, None, None).into()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Protocol(ref p) if p.status == 502));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn no_dispatch_without_credentials() {
        let exchange = Arc::new(MockExchange::new(Reply::Grant(TimeDelta::hours(1))));
        let store = Arc::new(MemoryCredentialStore::new());
        let gateway = RequestGateway::new(coordinator_with(store, exchange));
        let attempts = AtomicUsize::new(0);

        let err = gateway
            .execute("chat", |_token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::Unauthenticated)));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_after_rejection_expires_session() {
        let exchange = Arc::new(MockExchange::new(Reply::Reject));
        let store = Arc::new(MemoryCredentialStore::with_credentials(
            credentials_expiring_in(TimeDelta::minutes(30)),
        ));
        let gateway = RequestGateway::new(coordinator_with(store.clone(), exchange.clone()));
        let attempts = AtomicUsize::new(0);

        let err = gateway
            .execute("chat", |_token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(unauthorized()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn phase_display() {
        assert_eq!(CallPhase::Refreshing.to_string(), "refreshing");
    }
}
