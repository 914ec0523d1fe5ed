//! Protocol Module
//!
//! Defines the wire protocol shared by the client, the origin server and any
//! cache surrogate sitting between them.
//!
//! ## Protocol Format (fixed width, network byte order)
//!
//! ### Request Format
//! ```text
//! ┌──────────────────┐
//! │     Key (4)      │
//! └──────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────────────┬───────────┬──────────────────┐
//! │     Key (4)      │ Valid (1) │    Value (4)     │
//! └──────────────────┴───────────┴──────────────────┘
//! ```
//!
//! ### Valid Byte
//! - 0x00: key not found, value is 0
//! - 0x01: value holds the looked-up value

mod request;
mod response;
mod codec;

pub use request::Request;
pub use response::Response;
pub use codec::{
    encode_request, decode_request, encode_response, decode_response,
    REQUEST_SIZE, RESPONSE_SIZE, MAX_DATAGRAM_SIZE,
};

/// Well-known UDP port shared by client, server and cache tier
pub const UDP_PORT: u16 = 1234;
