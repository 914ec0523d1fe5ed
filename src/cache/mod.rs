//! Cache Module
//!
//! A surrogate answerer that sits between clients and the origin.
//!
//! ## Lookup Order
//! 1. Static entries (provisioned at start, never reach upstream)
//! 2. Memo table (valid upstream answers seen earlier)
//! 3. Upstream answerer (usually a [`RemoteOrigin`])
//!
//! Not-found answers are passed through but never memoized, so a key that
//! later appears at the origin becomes visible.

mod tier;
mod remote;

pub use tier::{CacheTier, CacheStats, CacheStatsSnapshot, AnswerSource};
pub use remote::RemoteOrigin;
