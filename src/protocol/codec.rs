//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! All integers are big-endian.
//!
//! ### Request
//! ```text
//! ┌──────────────────┐
//! │   key: u32 (4)   │
//! └──────────────────┘
//! ```
//!
//! ### Response
//! ```text
//! ┌──────────────────┬──────────────┬──────────────────┐
//! │   key: u32 (4)   │ valid: u8(1) │  value: u32 (4)  │
//! └──────────────────┴──────────────┴──────────────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};
use crate::error::{Result, TierError};
use super::{Request, Response};

/// Encoded request size: key (4)
pub const REQUEST_SIZE: usize = 4;

/// Encoded response size: key (4) + valid (1) + value (4)
pub const RESPONSE_SIZE: usize = 9;

/// Receive buffer size used by every tier
pub const MAX_DATAGRAM_SIZE: usize = 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> BytesMut {
    let mut frame = BytesMut::with_capacity(REQUEST_SIZE);
    frame.put_u32(request.key);
    frame
}

/// Decode a request from a single datagram
///
/// The datagram must be exactly [`REQUEST_SIZE`] bytes.
pub fn decode_request(mut bytes: &[u8]) -> Result<Request> {
    check_len("request", REQUEST_SIZE, bytes.len())?;
    Ok(Request {
        key: bytes.get_u32(),
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> BytesMut {
    let mut frame = BytesMut::with_capacity(RESPONSE_SIZE);
    frame.put_u32(response.key);
    frame.put_u8(response.valid as u8);
    frame.put_u32(response.value);
    frame
}

/// Decode a response from a single datagram
pub fn decode_response(mut bytes: &[u8]) -> Result<Response> {
    check_len("response", RESPONSE_SIZE, bytes.len())?;

    let key = bytes.get_u32();
    let valid = match bytes.get_u8() {
        0x00 => false,
        0x01 => true,
        other => {
            return Err(TierError::MalformedFrame(format!(
                "invalid valid flag: 0x{:02x}",
                other
            )))
        }
    };
    let value = bytes.get_u32();

    Ok(Response { key, valid, value })
}

fn check_len(kind: &str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(TierError::MalformedFrame(format!(
            "{} frame: expected {} bytes, got {}",
            kind, expected, actual
        )));
    }
    Ok(())
}
