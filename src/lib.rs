//! # TierKV
//!
//! A tiered key-value lookup service over UDP:
//! - Fixed-width request/response frames in network byte order
//! - Origin server holding an immutable key → value store
//! - Client with a bounded wait and key-echo validation
//! - Cache surrogate with static entries and memoized origin answers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │              (one request, one bounded wait)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ UDP :1234
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Cache Tier (optional)                        │
//! │          static entries → memo table → forward               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ UDP :1234
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Origin Server                             │
//! │              receive → answer → reply                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │ OriginStore │
//!                │ (immutable) │
//!                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod answer;
pub mod cache;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TierError, Result};
pub use config::Config;
pub use answer::{Answer, Origin};
pub use cache::{CacheTier, RemoteOrigin};
pub use network::{Client, LookupOutcome, Server};
pub use protocol::{Request, Response, UDP_PORT};
pub use store::{OriginStore, Override};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TierKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
