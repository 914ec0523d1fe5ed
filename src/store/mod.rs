//! Store Module
//!
//! The authoritative key → value mapping held by the origin server.
//!
//! ## Responsibilities
//! - Seed from the built-in base mapping
//! - Overlay `key=value` overrides supplied at startup (last write wins)
//! - Answer lookups without locking (immutable after construction)

mod origin;
mod overrides;

pub use origin::{OriginStore, StoreBuilder};
pub use overrides::Override;

/// Entries every origin store starts with
pub const BASE_ENTRIES: [(u32, u32); 2] = [(1, 11), (2, 22)];
