//! Short-lived cache for the ledger summary shown on dashboards.
//!
//! Entries expire after a TTL, and every successful mutation calls
//! [`StatsCache::invalidate`] so a reader never sees totals older than the
//! last write it could have observed.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cashbook_core::DomainResult;
use cashbook_ledger::LedgerSummary;

#[derive(Debug, Clone, Copy)]
struct Cached {
    summary: LedgerSummary,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct StatsCache {
    ttl: Duration,
    /// Bumped on every invalidation. A computation that started under an
    /// older generation is returned but never stored.
    generation: AtomicU64,
    entry: Mutex<Option<Cached>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached summary, if any.
    pub fn get(&self) -> Option<LedgerSummary> {
        let entry = self.entry.lock().ok()?;
        entry
            .as_ref()
            .filter(|c| c.stored_at.elapsed() < self.ttl)
            .map(|c| c.summary)
    }

    /// Serve from cache or run `compute` and remember its result.
    pub fn get_or_compute<F>(&self, compute: F) -> DomainResult<LedgerSummary>
    where
        F: FnOnce() -> DomainResult<LedgerSummary>,
    {
        if let Some(summary) = self.get() {
            tracing::debug!("ledger summary cache hit");
            return Ok(summary);
        }

        tracing::debug!("ledger summary cache miss");
        let generation = self.generation.load(Ordering::Acquire);
        let summary = compute()?;

        if let Ok(mut entry) = self.entry.lock() {
            if self.generation.load(Ordering::Acquire) == generation {
                *entry = Some(Cached {
                    summary,
                    stored_at: Instant::now(),
                });
            }
        }
        Ok(summary)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut entry) = self.entry.lock() {
            *entry = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn summary(balance: rust_decimal::Decimal) -> LedgerSummary {
        LedgerSummary {
            balance,
            ..LedgerSummary::default()
        }
    }

    #[test]
    fn second_read_is_served_from_cache() {
        let cache = StatsCache::new(Duration::from_secs(300));
        let calls = Cell::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_compute(|| {
                    calls.set(calls.get() + 1);
                    Ok(summary(dec!(10)))
                })
                .unwrap();
            assert_eq!(got.balance, dec!(10));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let cache = StatsCache::new(Duration::from_secs(300));
        cache.get_or_compute(|| Ok(summary(dec!(1)))).unwrap();
        cache.invalidate();
        assert!(cache.get().is_none());

        let got = cache.get_or_compute(|| Ok(summary(dec!(2)))).unwrap();
        assert_eq!(got.balance, dec!(2));
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = StatsCache::new(Duration::ZERO);
        cache.get_or_compute(|| Ok(summary(dec!(1)))).unwrap();
        assert!(cache.get().is_none());
    }

    #[test]
    fn result_computed_across_an_invalidation_is_not_stored() {
        let cache = StatsCache::new(Duration::from_secs(300));
        let got = cache
            .get_or_compute(|| {
                cache.invalidate();
                Ok(summary(dec!(5)))
            })
            .unwrap();
        assert_eq!(got.balance, dec!(5));
        assert!(cache.get().is_none());
    }

    #[test]
    fn compute_errors_propagate_and_leave_cache_empty() {
        let cache = StatsCache::new(Duration::from_secs(300));
        let err = cache
            .get_or_compute(|| Err(cashbook_core::DomainError::persistence("down")))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(cache.get().is_none());
    }
}
