//! Coordinator configuration.

use chrono::TimeDelta;

/// Default lead time before expiry at which a token is refreshed.
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// Default capacity of the session event channel.
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Tuning for the [`RefreshCoordinator`](crate::RefreshCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// A token is near expiry once `now >= expires_at - refresh_buffer`.
    pub refresh_buffer: TimeDelta,
    /// Number of session events buffered per subscriber.
    pub event_capacity: usize,
}

impl CoordinatorConfig {
    /// Set the refresh buffer.
    pub fn with_refresh_buffer(mut self, refresh_buffer: TimeDelta) -> Self {
        self.refresh_buffer = refresh_buffer;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            refresh_buffer: TimeDelta::seconds(DEFAULT_REFRESH_BUFFER_SECS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
