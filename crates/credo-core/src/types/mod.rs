//! Validated identity and endpoint types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod service_url;
mod user_id;

pub use service_url::ServiceUrl;
pub use user_id::UserId;
