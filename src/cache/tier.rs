//! Cache tier implementation
//!
//! Static table + RwLock-guarded memo table in front of an upstream answerer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::answer::Answer;
use crate::error::Result;
use crate::protocol::{Request, Response};
use crate::store::Override;

/// Which part of the tier produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Static,
    Memo,
    Upstream,
}

/// Hit/miss counters
#[derive(Debug, Default)]
pub struct CacheStats {
    pub static_hits: AtomicU64,
    pub memo_hits: AtomicU64,
    pub forwarded: AtomicU64,
    pub memoized: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub static_hits: u64,
    pub memo_hits: u64,
    pub forwarded: u64,
    pub memoized: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            static_hits: self.static_hits.load(Ordering::Relaxed),
            memo_hits: self.memo_hits.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            memoized: self.memoized.load(Ordering::Relaxed),
        }
    }
}

/// Surrogate answerer with static and dynamic entries
///
/// ## Concurrency
/// - Static entries are read-only after construction
/// - The memo table takes a read lock on lookup and a write lock on insert
/// - Two concurrent forwards for the same key both insert; last writer wins
pub struct CacheTier<U> {
    upstream: U,
    static_entries: HashMap<u32, u32>,
    memo: RwLock<HashMap<u32, u32>>,
    memo_capacity: Option<usize>,
    stats: CacheStats,
}

impl<U: Answer> CacheTier<U> {
    /// Create a tier with no static entries and an unbounded memo table
    pub fn new(upstream: U) -> Self {
        Self {
            upstream,
            static_entries: HashMap::new(),
            memo: RwLock::new(HashMap::new()),
            memo_capacity: None,
            stats: CacheStats::default(),
        }
    }

    /// Provision static entries (later entries for the same key win)
    pub fn with_static<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = Override>,
    {
        for entry in entries {
            self.static_entries.insert(entry.key, entry.value);
        }
        self
    }

    /// Stop memoizing new keys once the memo table holds `capacity` entries
    pub fn with_memo_capacity(mut self, capacity: Option<usize>) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Answer from static or memoized entries only
    pub fn answer_cached(&self, request: &Request) -> Option<(Response, AnswerSource)> {
        let key = request.key;

        if let Some(&value) = self.static_entries.get(&key) {
            self.stats.static_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache: static hit for key {}", key);
            return Some((Response::found(key, value), AnswerSource::Static));
        }

        let memoized = self.memo.read().get(&key).copied();
        memoized.map(|value| {
            self.stats.memo_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache: memo hit for key {}", key);
            (Response::found(key, value), AnswerSource::Memo)
        })
    }

    /// Answer a request and report where the answer came from
    pub fn answer_with_source(&self, request: &Request) -> Result<(Response, AnswerSource)> {
        if let Some(cached) = self.answer_cached(request) {
            return Ok(cached);
        }
        self.forward(request).map(|response| (response, AnswerSource::Upstream))
    }

    fn forward(&self, request: &Request) -> Result<Response> {
        let key = request.key;

        self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("cache: forwarding key {} upstream", key);
        let response = self.upstream.answer(request)?;

        if response.valid && response.key == key {
            self.memoize(key, response.value);
        }

        Ok(response)
    }

    fn memoize(&self, key: u32, value: u32) {
        let mut memo = self.memo.write();
        if let Some(capacity) = self.memo_capacity {
            if memo.len() >= capacity && !memo.contains_key(&key) {
                tracing::trace!("cache: memo table full, not recording key {}", key);
                return;
            }
        }
        memo.insert(key, value);
        self.stats.memoized.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop a memoized entry; static entries are unaffected
    pub fn evict(&self, key: u32) -> bool {
        self.memo.write().remove(&key).is_some()
    }

    /// Drop every memoized entry
    pub fn clear_memo(&self) {
        self.memo.write().clear();
    }

    /// Memoized value for a key, if any
    pub fn memoized(&self, key: u32) -> Option<u32> {
        self.memo.read().get(&key).copied()
    }

    pub fn memo_len(&self) -> usize {
        self.memo.read().len()
    }

    pub fn static_len(&self) -> usize {
        self.static_entries.len()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }
}

impl<U: Answer> Answer for CacheTier<U> {
    fn answer(&self, request: &Request) -> Result<Response> {
        self.answer_with_source(request).map(|(response, _)| response)
    }

    fn answer_local(&self, request: &Request) -> Option<Response> {
        self.answer_cached(request).map(|(response, _)| response)
    }
}
