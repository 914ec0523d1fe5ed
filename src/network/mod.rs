//! Network Module
//!
//! UDP server and client.
//!
//! ## Architecture
//! - Single receive thread per server
//! - Optional worker thread pool for datagram handling
//! - Requests answered through any [`Answer`](crate::answer::Answer)
//! - Client: one request, one bounded wait, one outcome

mod server;
mod client;

pub use server::{Server, ServerHandle, ServerStats, ServerStatsSnapshot, ShutdownHandle};
pub use client::{Client, LookupOutcome, lookup, resolve};
