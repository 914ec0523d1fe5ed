//! Error types for TierKV
//!
//! Provides a unified error type for all operations.
//!
//! A key that is absent from every tier is NOT an error: lookups report it as
//! [`LookupOutcome::NotFound`](crate::network::LookupOutcome).

use std::time::Duration;
use thiserror::Error;

/// Result type alias using TierError
pub type Result<T> = std::result::Result<T, TierError>;

/// Unified error type for TierKV operations
#[derive(Debug, Error)]
pub enum TierError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Could not resolve address: {0}")]
    Resolve(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Protocol mismatch: requested key {expected}, response carried key {actual}")]
    ProtocolMismatch { expected: u32, actual: u32 },

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    #[error("Server thread panicked")]
    ServerPanicked,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TierError {
    /// Returns true if the error is a client-side reply timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, TierError::Timeout(_))
    }
}
