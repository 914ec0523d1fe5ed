//! Request definitions
//!
//! A lookup request sent by a client.

/// A single key lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Request {
    /// The key to look up
    pub key: u32,
}

impl Request {
    pub fn new(key: u32) -> Self {
        Self { key }
    }
}
