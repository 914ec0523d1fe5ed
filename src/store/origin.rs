//! Origin store implementation
//!
//! HashMap-based store, frozen once built.

use std::collections::HashMap;

use super::{Override, BASE_ENTRIES};

/// Immutable key → value mapping
///
/// There is no mutation API: every entry is supplied through [`StoreBuilder`]
/// before the store is handed to the server, so it can be shared across
/// worker threads behind a plain `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginStore {
    entries: HashMap<u32, u32>,
}

impl OriginStore {
    /// Create a new store builder
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Store holding only the base entries
    pub fn with_base() -> Self {
        Self::builder().base().build()
    }

    /// Base entries overlaid with the given overrides, applied in order
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = Override>,
    {
        Self::builder().base().overrides(overrides).build()
    }

    /// Look up a key
    pub fn lookup(&self, key: u32) -> Option<u32> {
        self.entries.get(&key).copied()
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(u32, u32)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_unstable();
        entries
    }
}

/// Builder for OriginStore
///
/// Later inserts for the same key overwrite earlier ones.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    entries: HashMap<u32, u32>,
}

impl StoreBuilder {
    /// Add the built-in base entries
    pub fn base(mut self) -> Self {
        self.entries.extend(BASE_ENTRIES);
        self
    }

    /// Insert a single entry
    pub fn insert(mut self, key: u32, value: u32) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Apply overrides in the order given
    pub fn overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = Override>,
    {
        for ov in overrides {
            self.entries.insert(ov.key, ov.value);
        }
        self
    }

    pub fn build(self) -> OriginStore {
        OriginStore {
            entries: self.entries,
        }
    }
}
