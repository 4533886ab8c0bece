//! Segment model and the shared segment-id source.
//!
//! Ids are handed out by an atomic counter: each call to [`SegmentIds::claim`]
//! returns an id no other caller will ever see, so two fetchers never work on
//! the same segment.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default exclusive upper bound on segment ids. A safety cap, not a protocol limit.
pub const DEFAULT_MAX_SEGMENT_ID: u64 = 999_999;

/// A fetched segment on its way from a fetcher to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: u64,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn new(id: u64, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }
}

/// Bounded, strictly increasing source of segment ids with exclusive claims.
#[derive(Debug)]
pub struct SegmentIds {
    next: AtomicU64,
    end: u64,
}

impl SegmentIds {
    /// Ids `start..end` will be produced, in order.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            end,
        }
    }

    /// Claim the next id. Returns `None` once the ceiling is reached.
    pub fn claim(&self) -> Option<u64> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.end).then_some(n + 1)
            })
            .ok()
    }

    /// The id the next `claim` would return (or the ceiling when exhausted).
    pub fn next_unclaimed(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn claims_are_sequential_and_bounded() {
        let ids = SegmentIds::new(3, 6);
        assert_eq!(ids.claim(), Some(3));
        assert_eq!(ids.claim(), Some(4));
        assert_eq!(ids.claim(), Some(5));
        assert_eq!(ids.claim(), None);
        assert_eq!(ids.claim(), None);
        assert_eq!(ids.next_unclaimed(), 6);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let ids = SegmentIds::new(10, 10);
        assert_eq!(ids.claim(), None);
    }

    #[test]
    fn concurrent_claims_are_exclusive() {
        let ids = Arc::new(SegmentIds::new(0, 10_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(id) = ids.claim() {
                        got.push(id);
                    }
                    got
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "id {} claimed twice", id);
            }
        }
        assert_eq!(seen.len(), 10_000);
    }
}
