//! Response definitions
//!
//! Represents the answer to a single [`Request`](super::Request), produced by
//! whichever tier answers it.

/// A response to send back to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// Echo of the requested key
    pub key: u32,

    /// Whether `value` is meaningful
    pub valid: bool,

    /// Looked-up value, 0 when `valid` is false
    pub value: u32,
}

impl Response {
    /// Create a response carrying a value
    pub fn found(key: u32, value: u32) -> Self {
        Self {
            key,
            valid: true,
            value,
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found(key: u32) -> Self {
        Self {
            key,
            valid: false,
            value: 0,
        }
    }

    /// Build a response from a store lookup result
    pub fn from_lookup(key: u32, value: Option<u32>) -> Self {
        match value {
            Some(value) => Self::found(key, value),
            None => Self::not_found(key),
        }
    }

    /// The value, if the response carries one
    pub fn value(&self) -> Option<u32> {
        self.valid.then_some(self.value)
    }
}
