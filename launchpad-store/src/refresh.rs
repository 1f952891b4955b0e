//! Fixed-interval background refresh of selected keys.
//!
//! Polling runs alongside mutation-triggered invalidation, never instead of
//! it: a key is refetched every interval whether or not anything changed.

use std::time::Duration;

use launchpad_core::QueryKey;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::query_cache::QueryCache;

/// Refetches a set of keys on a wall-clock interval.
#[derive(Debug, Clone)]
pub struct BackgroundRefresher {
    cache: QueryCache,
    keys: Vec<QueryKey>,
    interval: Duration,
}

impl BackgroundRefresher {
    /// Creates a refresher with no keys.
    pub fn new(cache: QueryCache, interval: Duration) -> Self {
        Self {
            cache,
            keys: Vec::new(),
            interval,
        }
    }

    /// Creates a refresher using the configured interval.
    pub fn from_config(cache: QueryCache, config: &RefreshConfig) -> Self {
        Self::new(cache, config.interval())
    }

    /// Adds a key to refresh. The key needs a fetcher registered in the
    /// cache, either by a read or by [`QueryCache::register`].
    #[must_use]
    pub fn with_key(mut self, key: QueryKey) -> Self {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Keys being refreshed.
    pub fn keys(&self) -> &[QueryKey] {
        &self.keys
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs the refresher on the current runtime until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Runs the refresh loop until `cancel` fires.
    ///
    /// The first refresh happens one full interval after start. Failures are
    /// logged and the existing entry is left in place. Cancelling during a
    /// refresh abandons it.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            keys = self.keys.len(),
            "Background refresh started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // A hung refetch must not hold off cancellation.
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = self.refresh_all() => {}
                    }
                }
            }
        }

        info!("Background refresh stopped");
    }

    async fn refresh_all(&self) {
        for key in &self.keys {
            match self.cache.refetch(key).await {
                Ok(true) => debug!(key = %key, "Background refresh done"),
                Ok(false) => debug!(key = %key, "No fetcher registered, skipping"),
                Err(err) => warn!(key = %key, error = %err, "Background refresh failed"),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::keys;
    use launchpad_fetch::RequestError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(cache: &QueryCache, key: &QueryKey) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        cache.register(key, move || {
            let counter = Arc::clone(&counter);
            async move { Ok::<_, RequestError>(counter.fetch_add(1, Ordering::SeqCst)) }
        });
        calls
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_at_interval_without_mutations() {
        let cache = QueryCache::new();
        let calls = counting(&cache, &keys::unread_count());
        let cancel = CancellationToken::new();

        let handle = BackgroundRefresher::new(cache.clone(), Duration::from_secs(30))
            .with_key(keys::unread_count())
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_invalidation_does_not_disturb_refresh() {
        let cache = QueryCache::new();
        let calls = counting(&cache, &keys::unread_count());
        let startup_calls = counting(&cache, &keys::startups());
        let cancel = CancellationToken::new();

        let handle = BackgroundRefresher::new(cache.clone(), Duration::from_secs(30))
            .with_key(keys::unread_count())
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(10)).await;
        cache.invalidate(&[keys::startups()]);

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.info(&keys::unread_count()).unwrap().stale);
        assert_eq!(startup_calls.load(Ordering::SeqCst), 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_entry_and_continues() {
        let cache = QueryCache::new();
        let key = keys::unread_count();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        cache
            .read(&key, move || {
                let counter = Arc::clone(&counter);
                async move {
                    match counter.fetch_add(1, Ordering::SeqCst) {
                        0 => Ok(3u64),
                        1 => Err(RequestError::Http {
                            status: 500,
                            message: "HTTP 500".into(),
                        }),
                        _ => Ok(5u64),
                    }
                }
            })
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let handle = BackgroundRefresher::new(cache.clone(), Duration::from_secs(30))
            .with_key(key.clone())
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cache.peek::<u64>(&key).as_deref(), Some(&3));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.peek::<u64>(&key).as_deref(), Some(&5));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_hung_refresh() {
        let cache = QueryCache::new();
        let key = keys::unread_count();
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        cache.register(&key, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<u64, RequestError>>().await
            }
        });

        let cancel = CancellationToken::new();
        let handle = BackgroundRefresher::new(cache, Duration::from_secs(30))
            .with_key(key)
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("refresher should stop while a refresh hangs")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let cache = QueryCache::new();
        let calls = counting(&cache, &keys::unread_count());
        let cancel = CancellationToken::new();

        let handle = BackgroundRefresher::new(cache, Duration::from_secs(30))
            .with_key(keys::unread_count())
            .spawn(cancel.clone());

        cancel.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
