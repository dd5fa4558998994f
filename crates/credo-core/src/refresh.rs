//! Single-flight token refresh.
//!
//! [`RefreshCoordinator`] is the only component that decides whether the
//! current access token is usable and the only writer of the credential store
//! once a session exists. Concurrent callers that observe a stale token share
//! one in-flight exchange: the exchange runs in a spawned task, and every
//! caller awaits a shared handle to its outcome.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::config::CoordinatorConfig;
use crate::error::{AuthError, Error};
use crate::events::SessionEvent;
use crate::traits::{CredentialStore, TokenExchange};
use crate::types::UserId;
use crate::{AccessToken, CredentialSet, Result, TokenGrant};

type InFlight = Shared<BoxFuture<'static, Result<AccessToken>>>;

/// Whether a refresh exchange is currently running.
///
/// Each exchange carries a generation so that only the exchange that owns the
/// slot can return it to `Idle`.
enum RefreshState {
    Idle,
    Refreshing { generation: u64, in_flight: InFlight },
}

/// What a caller should do after inspecting the current credentials.
enum Decision {
    Current(AccessToken),
    Wait(InFlight),
}

/// A secret-free summary of the signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// The signed-in user.
    pub user_id: UserId,
    /// Expiry of the current access token.
    pub expires_at: DateTime<Utc>,
    /// Whether the next authenticated call will trigger a refresh.
    pub near_expiry: bool,
    /// Whether a refresh token is available.
    pub refreshable: bool,
}

/// Owner of the access/refresh token lifecycle.
///
/// Cheap to clone; clones share the same store, exchange and in-flight
/// refresh slot.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use credo_core::{CoordinatorConfig, MemoryCredentialStore, RefreshCoordinator, TokenExchange};
///
/// # async fn example(exchange: Arc<dyn TokenExchange>) -> Result<(), credo_core::Error> {
/// let store = Arc::new(MemoryCredentialStore::new());
/// let coordinator = RefreshCoordinator::new(store, exchange, CoordinatorConfig::default());
///
/// let token = coordinator.ensure_fresh().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    store: Arc<dyn CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    config: CoordinatorConfig,
    state: Mutex<RefreshState>,
    next_generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl RefreshCoordinator {
    /// Create a coordinator over `store`, refreshing through `exchange`.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        config: CoordinatorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                exchange,
                config,
                state: Mutex::new(RefreshState::Idle),
                next_generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Returns the configuration this coordinator was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns true while a refresh exchange is running.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Establish the credential set handed over by sign-in completion.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserMismatch`] if a different user is already
    /// signed in; that user must be signed out first.
    #[instrument(skip(self, set), fields(user_id = %set.user_id()))]
    pub fn establish(&self, set: CredentialSet) -> Result<()> {
        {
            let _state = self.inner.lock_state();

            if let Some(existing) = self.inner.store.load()?
                && existing.user_id() != set.user_id()
            {
                return Err(AuthError::UserMismatch {
                    established: existing.user_id().to_string(),
                    attempted: set.user_id().to_string(),
                }
                .into());
            }

            self.inner.store.save(&set)?;
        }

        info!(expires_at = %set.expires_at(), "Credentials established");
        self.inner.emit(SessionEvent::Established {
            user_id: set.user_id().clone(),
        });
        Ok(())
    }

    /// Discard the credential set unconditionally.
    #[instrument(skip(self))]
    pub fn sign_out(&self) -> Result<()> {
        {
            let _state = self.inner.lock_state();
            self.inner.store.clear()?;
        }

        info!("Signed out");
        self.inner.emit(SessionEvent::SignedOut);
        Ok(())
    }

    /// Describe the current session without exposing any token.
    pub fn status(&self) -> Result<Option<SessionStatus>> {
        let now = Utc::now();
        Ok(self.inner.store.load()?.map(|set| SessionStatus {
            user_id: set.user_id().clone(),
            expires_at: set.expires_at(),
            near_expiry: set.is_near_expiry(now, self.inner.config.refresh_buffer),
            refreshable: set.refresh_token().is_some(),
        }))
    }

    /// Returns a usable access token, refreshing it first if it is near expiry.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if no credentials exist
    /// - [`AuthError::SessionExpired`] if the refresh exchange was rejected
    /// - a transient transport error if the token endpoint was unreachable
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self) -> Result<AccessToken> {
        let buffer = self.inner.config.refresh_buffer;
        let now = Utc::now();

        match self.decide(|current| current.is_near_expiry(now, buffer))? {
            Decision::Current(token) => {
                debug!("Access token is fresh");
                Ok(token)
            }
            Decision::Wait(in_flight) => in_flight.await,
        }
    }

    /// Refresh regardless of the computed expiry.
    ///
    /// Used when a caller has independent evidence that the token is invalid,
    /// such as clock skew or early revocation by the provider. Joins an
    /// in-flight refresh instead of starting a second one.
    #[instrument(skip(self))]
    pub async fn force_refresh(&self) -> Result<AccessToken> {
        match self.decide(|_| true)? {
            Decision::Current(token) => Ok(token),
            Decision::Wait(in_flight) => in_flight.await,
        }
    }

    /// Obtain a replacement for a token a remote collaborator just rejected.
    ///
    /// If the stored token already differs from `rejected`, another call
    /// refreshed in the meantime and the stored token is returned without a
    /// new exchange. Otherwise this behaves like [`force_refresh`](Self::force_refresh).
    #[instrument(skip_all)]
    pub async fn refresh_after_rejection(&self, rejected: &AccessToken) -> Result<AccessToken> {
        match self.decide(|current| current.access_token() == rejected)? {
            Decision::Current(token) => {
                debug!("Token was already replaced by a concurrent refresh");
                Ok(token)
            }
            Decision::Wait(in_flight) => in_flight.await,
        }
    }

    /// Inspect the stored credentials and either hand back the current token
    /// or a handle to the (possibly newly started) in-flight refresh.
    fn decide(&self, needs_refresh: impl FnOnce(&CredentialSet) -> bool) -> Result<Decision> {
        let mut state = self.inner.lock_state();

        let current = self
            .inner
            .store
            .load()?
            .ok_or(AuthError::Unauthenticated)?;

        if !needs_refresh(&current) {
            return Ok(Decision::Current(current.access_token().clone()));
        }

        let in_flight = match &*state {
            RefreshState::Refreshing { in_flight, .. } => {
                debug!("Joining in-flight refresh");
                in_flight.clone()
            }
            RefreshState::Idle => self.start_refresh(&mut state, current),
        };

        Ok(Decision::Wait(in_flight))
    }

    fn start_refresh(&self, state: &mut RefreshState, snapshot: CredentialSet) -> InFlight {
        info!(user_id = %snapshot.user_id(), "Starting token refresh");

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _idle = ReturnToIdle {
                inner: Arc::clone(&inner),
                generation,
            };
            inner.run_refresh(generation, snapshot).await
        });

        let in_flight = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(Error::Internal(format!("refresh task failed: {}", err))),
            }
        }
        .boxed()
        .shared();

        *state = RefreshState::Refreshing {
            generation,
            in_flight: in_flight.clone(),
        };
        in_flight
    }
}

impl CoordinatorInner {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Return the slot to `Idle` if `generation` still owns it.
    fn finish(&self, state: &mut RefreshState, generation: u64) {
        if matches!(state, RefreshState::Refreshing { generation: g, .. } if *g == generation) {
            *state = RefreshState::Idle;
        }
    }

    async fn run_refresh(&self, generation: u64, snapshot: CredentialSet) -> Result<AccessToken> {
        let Some(refresh_token) = snapshot.refresh_token() else {
            warn!("No refresh token available");
            return self.expire(generation, &snapshot);
        };

        match self
            .exchange
            .refresh(snapshot.user_id(), refresh_token)
            .await
        {
            Ok(grant) => self.commit(generation, &snapshot, grant),
            Err(err) if err.is_transient() => {
                self.finish(&mut self.lock_state(), generation);
                warn!(error = %err, "Token endpoint unreachable, keeping credentials");
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh rejected");
                self.expire(generation, &snapshot)
            }
        }
    }

    /// Store the renewed token unless the session changed underneath us.
    ///
    /// The slot goes back to `Idle` under the same lock as the write, so a
    /// caller holding the renewed token never joins this finished exchange.
    fn commit(
        &self,
        generation: u64,
        snapshot: &CredentialSet,
        grant: TokenGrant,
    ) -> Result<AccessToken> {
        let renewed = {
            let mut state = self.lock_state();
            self.finish(&mut state, generation);

            let current = match self.store.load()? {
                Some(current) if current.user_id() == snapshot.user_id() => current,
                _ => {
                    info!("Signed out during refresh, discarding renewed token");
                    return Err(AuthError::Unauthenticated.into());
                }
            };

            if current.access_token() != snapshot.access_token() {
                debug!("Credentials replaced during refresh, keeping the newer set");
                return Ok(current.access_token().clone());
            }

            let renewed = current.with_grant(grant);
            self.store.save(&renewed)?;
            renewed
        };

        info!(expires_at = %renewed.expires_at(), "Token refreshed");
        self.emit(SessionEvent::Refreshed {
            user_id: renewed.user_id().clone(),
            expires_at: renewed.expires_at(),
        });

        Ok(renewed.access_token().clone())
    }

    /// End the session after a failed refresh.
    ///
    /// Credentials established while the exchange ran are left alone: the same
    /// user gets the newer token back, anyone else is told to sign in.
    fn expire(&self, generation: u64, snapshot: &CredentialSet) -> Result<AccessToken> {
        {
            let mut state = self.lock_state();
            self.finish(&mut state, generation);

            match self.store.load() {
                Ok(Some(current)) if current.user_id() != snapshot.user_id() => {
                    debug!("Another user signed in during refresh");
                    return Err(AuthError::Unauthenticated.into());
                }
                Ok(Some(current)) if current.access_token() != snapshot.access_token() => {
                    debug!("Credentials replaced during refresh, leaving them in place");
                    return Ok(current.access_token().clone());
                }
                Ok(None) => {
                    debug!("Signed out during refresh");
                    return Err(AuthError::Unauthenticated.into());
                }
                _ => {
                    if let Err(err) = self.store.clear() {
                        error!(error = %err, "Failed to clear expired credentials");
                    }
                }
            }
        }

        info!(user_id = %snapshot.user_id(), "Session expired");
        self.emit(SessionEvent::Expired {
            user_id: snapshot.user_id().clone(),
        });

        Err(AuthError::SessionExpired.into())
    }
}

/// Returns the slot to `Idle` if the refresh task ends without doing so,
/// which only happens when it panics.
struct ReturnToIdle {
    inner: Arc<CoordinatorInner>,
    generation: u64,
}

impl Drop for ReturnToIdle {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        self.inner.finish(&mut state, self.generation);
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("config", &self.inner.config)
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
