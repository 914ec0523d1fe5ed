//! Cache Tier Tests
//!
//! Tests verify:
//! - Static entries take precedence and never reach upstream
//! - Valid upstream answers are memoized
//! - Not-found answers are never memoized
//! - Memo capacity and eviction
//! - Concurrent access patterns

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use tierkv::cache::{AnswerSource, CacheTier};
use tierkv::protocol::{Request, Response};
use tierkv::store::{OriginStore, Override};
use tierkv::{Answer, Origin, Result, TierError};

// =============================================================================
// Helpers
// =============================================================================

/// Upstream that counts calls and can be mutated between lookups
#[derive(Default)]
struct CountingUpstream {
    entries: RwLock<Vec<(u32, u32)>>,
    calls: AtomicUsize,
}

impl CountingUpstream {
    fn with(entries: &[(u32, u32)]) -> Self {
        Self {
            entries: RwLock::new(entries.to_vec()),
            calls: AtomicUsize::new(0),
        }
    }

    fn insert(&self, key: u32, value: u32) {
        self.entries.write().push((key, value));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Answer for CountingUpstream {
    fn answer(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = self
            .entries
            .read()
            .iter()
            .rev()
            .find(|(k, _)| *k == request.key)
            .map(|(_, v)| *v);
        Ok(Response::from_lookup(request.key, value))
    }
}

struct FailingUpstream;

impl Answer for FailingUpstream {
    fn answer(&self, _request: &Request) -> Result<Response> {
        Err(TierError::Timeout(std::time::Duration::from_millis(1)))
    }
}

fn tier_over(entries: &[(u32, u32)]) -> CacheTier<Arc<CountingUpstream>> {
    CacheTier::new(Arc::new(CountingUpstream::with(entries)))
}

// =============================================================================
// Static Entry Tests
// =============================================================================

#[test]
fn test_static_entry_short_circuits() {
    let tier = tier_over(&[(1, 11)]).with_static(vec![Override::new(3, 33)]);

    let (response, source) = tier.answer_with_source(&Request::new(3)).unwrap();

    assert_eq!(response, Response::found(3, 33));
    assert_eq!(source, AnswerSource::Static);
    assert_eq!(tier.upstream().calls(), 0);
}

#[test]
fn test_static_entry_beats_origin_value() {
    let tier = tier_over(&[(3, 1)]).with_static(vec![Override::new(3, 33)]);

    assert_eq!(tier.answer(&Request::new(3)).unwrap().value(), Some(33));
    assert_eq!(tier.upstream().calls(), 0);
}

#[test]
fn test_static_entries_last_wins() {
    let tier = tier_over(&[]).with_static(vec![Override::new(3, 30), Override::new(3, 33)]);
    assert_eq!(tier.static_len(), 1);
    assert_eq!(tier.answer(&Request::new(3)).unwrap().value(), Some(33));
}

// =============================================================================
// Memoization Tests
// =============================================================================

#[test]
fn test_valid_answer_is_memoized() {
    let tier = tier_over(&[(1, 11)]);

    let (first, first_source) = tier.answer_with_source(&Request::new(1)).unwrap();
    let (second, second_source) = tier.answer_with_source(&Request::new(1)).unwrap();

    assert_eq!(first, Response::found(1, 11));
    assert_eq!(second, first);
    assert_eq!(first_source, AnswerSource::Upstream);
    assert_eq!(second_source, AnswerSource::Memo);
    assert_eq!(tier.upstream().calls(), 1);
    assert_eq!(tier.memoized(1), Some(11));
}

#[test]
fn test_not_found_is_never_memoized() {
    let tier = tier_over(&[]);

    for _ in 0..3 {
        let response = tier.answer(&Request::new(123)).unwrap();
        assert_eq!(response, Response::not_found(123));
    }

    assert_eq!(tier.upstream().calls(), 3);
    assert_eq!(tier.memo_len(), 0);
}

#[test]
fn test_key_added_upstream_becomes_visible() {
    let tier = tier_over(&[]);

    assert_eq!(tier.answer(&Request::new(8)).unwrap().value(), None);
    tier.upstream().insert(8, 88);
    assert_eq!(tier.answer(&Request::new(8)).unwrap().value(), Some(88));
}

#[test]
fn test_memo_capacity_stops_new_keys() {
    let tier = tier_over(&[(1, 11), (2, 22), (3, 33)]).with_memo_capacity(Some(2));

    for key in 1..=3 {
        tier.answer(&Request::new(key)).unwrap();
    }

    assert_eq!(tier.memo_len(), 2);
    assert_eq!(tier.memoized(3), None);

    // Unmemoized key still answered, via upstream
    let (response, source) = tier.answer_with_source(&Request::new(3)).unwrap();
    assert_eq!(response.value(), Some(33));
    assert_eq!(source, AnswerSource::Upstream);
}

#[test]
fn test_evict_and_clear() {
    let tier = tier_over(&[(1, 11), (2, 22)]).with_static(vec![Override::new(3, 33)]);
    tier.answer(&Request::new(1)).unwrap();
    tier.answer(&Request::new(2)).unwrap();

    assert!(tier.evict(1));
    assert!(!tier.evict(1));
    assert!(!tier.evict(3));
    assert_eq!(tier.memo_len(), 1);

    tier.clear_memo();
    assert_eq!(tier.memo_len(), 0);
    assert_eq!(tier.answer(&Request::new(3)).unwrap().value(), Some(33));
}

#[test]
fn test_upstream_error_propagates_and_is_not_cached() {
    let tier = CacheTier::new(FailingUpstream).with_static(vec![Override::new(3, 33)]);

    assert!(tier.answer(&Request::new(1)).unwrap_err().is_timeout());
    assert_eq!(tier.memo_len(), 0);
    assert_eq!(tier.answer(&Request::new(3)).unwrap().value(), Some(33));
}

#[test]
fn test_stats_track_sources() {
    let tier = tier_over(&[(1, 11)]).with_static(vec![Override::new(3, 33)]);

    tier.answer(&Request::new(3)).unwrap();
    tier.answer(&Request::new(1)).unwrap();
    tier.answer(&Request::new(1)).unwrap();
    tier.answer(&Request::new(9)).unwrap();

    let stats = tier.stats().snapshot();
    assert_eq!(stats.static_hits, 1);
    assert_eq!(stats.memo_hits, 1);
    assert_eq!(stats.forwarded, 2);
    assert_eq!(stats.memoized, 1);
}

// =============================================================================
// Contract Tests
// =============================================================================

#[test]
fn test_tier_and_origin_agree_on_origin_keys() {
    let store = OriginStore::with_base();
    let origin = Origin::new(store.clone());
    let tier = CacheTier::new(Origin::new(store));

    let answerers: [&dyn Answer; 2] = [&origin, &tier];
    for answerer in answerers {
        assert_eq!(answerer.answer(&Request::new(1)).unwrap(), Response::found(1, 11));
        assert_eq!(answerer.answer(&Request::new(2)).unwrap(), Response::found(2, 22));
        assert_eq!(answerer.answer(&Request::new(999)).unwrap(), Response::not_found(999));
    }
}

#[test]
fn test_concurrent_lookups() {
    let tier = Arc::new(tier_over(&[(1, 11), (2, 22)]));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let tier = Arc::clone(&tier);
            thread::spawn(move || {
                for _ in 0..100 {
                    let key = (i % 2) + 1;
                    let response = tier.answer(&Request::new(key)).unwrap();
                    assert_eq!(response.key, key);
                    assert_eq!(response.value(), Some(key * 11));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(tier.memo_len(), 2);
}
