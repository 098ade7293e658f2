use super::{DailyBar, PriceHistorySource};
use crate::errors::SimResult;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// TTL cache in front of a price-history provider, keyed by
/// (symbol, window_days). Replaces the original's process-wide memoized
/// fetch with an explicit component: the TTL is injected, and the provider
/// is generic so tests can run against a fake. Errors are never cached.
pub struct HistoryCache<P> {
    provider: P,
    ttl: Duration,
    entries: Mutex<HashMap<(String, u32), Entry>>,
    pub hits: AtomicU64,
    pub fetches: AtomicU64,
}

struct Entry {
    bars: Arc<Vec<DailyBar>>,
    fetched_at: Instant,
}

impl<P: PriceHistorySource> HistoryCache<P> {
    pub fn new(provider: P, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Cached bars for (symbol, window_days), fetching on miss or expiry.
    /// The returned Arc is shared with the cache; bars are immutable once
    /// fetched.
    pub async fn get(&self, symbol: &str, window_days: u32) -> SimResult<Arc<Vec<DailyBar>>> {
        let key = (symbol.to_string(), window_days);

        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::clone(&entry.bars));
                }
            }
        }

        // Fetch outside the lock; a concurrent miss may fetch twice, which
        // only costs a redundant round-trip.
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bars = Arc::new(self.provider.fetch_daily_bars(symbol, window_days).await?);

        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            Entry {
                bars: Arc::clone(&bars),
                fetched_at: Instant::now(),
            },
        );

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SimError;

    /// Provider that counts calls and can be switched to fail.
    struct FakeProvider {
        calls: AtomicU64,
        fail_first: AtomicU64,
    }

    impl FakeProvider {
        fn new(fail_first: u64) -> Self {
            Self {
                calls: AtomicU64::new(0),
                fail_first: AtomicU64::new(fail_first),
            }
        }
    }

    impl PriceHistorySource for FakeProvider {
        async fn fetch_daily_bars(
            &self,
            _symbol: &str,
            _window_days: u32,
        ) -> SimResult<Vec<DailyBar>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_first.load(Ordering::Relaxed) > 0 {
                self.fail_first.fetch_sub(1, Ordering::Relaxed);
                return Err(SimError::DataUnavailable("fake outage".into()));
            }
            let base = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            Ok((0..5)
                .map(|i| DailyBar {
                    date: base + chrono::Duration::days(i),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0 + i as f64,
                    volume: 1000,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = HistoryCache::new(FakeProvider::new(0), Duration::from_secs(60));
        let a = cache.get("005930.KS", 365).await.unwrap();
        let b = cache.get("005930.KS", 365).await.unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(cache.provider.calls.load(Ordering::Relaxed), 1);
        assert_eq!(cache.hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_distinct_windows_are_distinct_keys() {
        let cache = HistoryCache::new(FakeProvider::new(0), Duration::from_secs(60));
        cache.get("005930.KS", 365).await.unwrap();
        cache.get("005930.KS", 90).await.unwrap();
        assert_eq!(cache.provider.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cache = HistoryCache::new(FakeProvider::new(0), Duration::from_secs(0));
        cache.get("000660.KS", 365).await.unwrap();
        cache.get("000660.KS", 365).await.unwrap();
        assert_eq!(cache.provider.calls.load(Ordering::Relaxed), 2);
        assert_eq!(cache.hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = HistoryCache::new(FakeProvider::new(1), Duration::from_secs(60));
        let err = cache.get("003550.KS", 365).await.unwrap_err();
        assert!(matches!(err, SimError::DataUnavailable(_)));
        // Next call goes back to the provider and succeeds.
        let bars = cache.get("003550.KS", 365).await.unwrap();
        assert_eq!(bars.len(), 5);
        assert_eq!(cache.provider.calls.load(Ordering::Relaxed), 2);
    }
}
