//! Keyed query cache with fetch coalescing and prefix invalidation.
//!
//! Each [`QueryKey`] owns one slot holding the last fetched value, its
//! freshness, the number of live [`Subscription`]s and at most one in-flight
//! fetch. Readers that arrive while a fetch is running join it instead of
//! starting their own.
//!
//! Invalidation marks matching slots stale and drops their in-flight handle.
//! Every fetch carries a flight id, and only the slot's current flight may
//! store its result, so a fetch that started before an invalidation can never
//! overwrite data fetched after it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use launchpad_core::{QueryKey, QueryKeyPrefix};
use launchpad_fetch::RequestError;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StoreError;

type AnyValue = Arc<dyn Any + Send + Sync>;
type FetchOutput = Result<AnyValue, Arc<RequestError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutput>>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchOutput> + Send + Sync>;

// ============================================================================
// Entry Views
// ============================================================================

/// Observable state of one entry, published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStatus {
    /// The entry was invalidated and not yet successfully refetched.
    pub stale: bool,
    /// A fetch is running ("refreshing").
    pub fetching: bool,
    /// Bumped on every successful store.
    pub version: u64,
    /// Message of the last failed fetch, cleared on success.
    pub error: Option<String>,
}

/// Read-only snapshot of a cache entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Entry key.
    pub key: QueryKey,
    /// When the current data was fetched.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether the entry is stale.
    pub stale: bool,
    /// Whether a fetch is running.
    pub fetching: bool,
    /// Number of live subscriptions.
    pub subscriber_count: usize,
    /// Whether any value has been stored.
    pub has_data: bool,
}

// ============================================================================
// Slots
// ============================================================================

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct Slot {
    data: Option<AnyValue>,
    fetched_at: Option<DateTime<Utc>>,
    stale: bool,
    subscribers: usize,
    in_flight: Option<InFlight>,
    fetcher: Option<Fetcher>,
    status: watch::Sender<EntryStatus>,
}

impl Slot {
    fn new() -> Self {
        let (status, _) = watch::channel(EntryStatus::default());
        Self {
            data: None,
            fetched_at: None,
            stale: false,
            subscribers: 0,
            in_flight: None,
            fetcher: None,
            status,
        }
    }

    fn info(&self, key: &QueryKey) -> EntryInfo {
        EntryInfo {
            key: key.clone(),
            fetched_at: self.fetched_at,
            stale: self.stale,
            fetching: self.in_flight.is_some(),
            subscriber_count: self.subscribers,
            has_data: self.data.is_some(),
        }
    }
}

struct CacheInner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    next_flight: AtomicU64,
    max_entries: Option<usize>,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the slot for `key`, creating it (and evicting if bounded).
    fn slot<'a>(&self, slots: &'a mut HashMap<QueryKey, Slot>, key: &QueryKey) -> &'a mut Slot {
        if !slots.contains_key(key) {
            self.evict(slots);
            debug!(key = %key, "Creating cache entry");
        }
        slots.entry(key.clone()).or_insert_with(Slot::new)
    }

    /// Drops unsubscribed, idle entries until there is room for one more.
    ///
    /// Oldest `fetched_at` goes first; never-fetched entries sort oldest.
    fn evict(&self, slots: &mut HashMap<QueryKey, Slot>) {
        let Some(max) = self.max_entries else {
            return;
        };
        while slots.len() >= max {
            let victim = slots
                .iter()
                .filter(|(_, slot)| slot.subscribers == 0 && slot.in_flight.is_none())
                .min_by_key(|(_, slot)| slot.fetched_at)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    debug!(key = %key, "Evicting cache entry");
                    slots.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Starts a fetch for `slot` and records it as the current flight.
    fn start_flight(self: &Arc<Self>, key: &QueryKey, slot: &mut Slot, fetcher: Fetcher) -> SharedFetch {
        let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
        let cache = Arc::downgrade(self);
        let flight_key = key.clone();

        let fetch = async move {
            let result = fetcher().await;
            if let Some(cache) = cache.upgrade() {
                cache.complete(&flight_key, id, &result);
            }
            result
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            id,
            fetch: fetch.clone(),
        });
        slot.status.send_modify(|status| status.fetching = true);
        debug!(key = %key, flight = id, "Fetch started");
        fetch
    }

    /// Applies a finished fetch, unless a newer flight superseded it.
    fn complete(&self, key: &QueryKey, id: u64, result: &FetchOutput) {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(key) else {
            return;
        };
        if !slot.in_flight.as_ref().is_some_and(|flight| flight.id == id) {
            debug!(key = %key, flight = id, "Discarding superseded fetch result");
            return;
        }
        slot.in_flight = None;

        match result {
            Ok(value) => {
                slot.data = Some(Arc::clone(value));
                slot.fetched_at = Some(Utc::now());
                slot.stale = false;
                slot.status.send_modify(|status| {
                    status.stale = false;
                    status.fetching = false;
                    status.version += 1;
                    status.error = None;
                });
                debug!(key = %key, flight = id, "Fetch stored");
            }
            Err(err) => {
                slot.status.send_modify(|status| {
                    status.fetching = false;
                    status.error = Some(err.to_string());
                });
                debug!(key = %key, flight = id, error = %err, "Fetch failed");
            }
        }
    }
}

// ============================================================================
// Query Cache
// ============================================================================

/// Process-wide cache of fetched collections.
///
/// Created once and injected where needed; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("max_entries", &self.inner.max_entries)
            .finish()
    }
}

impl QueryCache {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Creates a cache holding at most `max_entries` entries.
    ///
    /// Entries with subscribers or a running fetch are never evicted, so the
    /// bound can be exceeded while they pin it.
    pub fn with_limit(max_entries: Option<usize>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: Mutex::new(HashMap::new()),
                next_flight: AtomicU64::new(1),
                max_entries: max_entries.map(|max| max.max(1)),
            }),
        }
    }

    /// Reads `key`, fetching with `fetcher` unless a fresh value is cached.
    ///
    /// Concurrent readers of the same key share one fetch and receive the
    /// same value. The fetcher is remembered so the entry can be refetched
    /// after invalidation or by the background refresher. A failed fetch
    /// leaves any previous value in place and is returned to every waiter.
    pub async fn read<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, StoreError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        let fetcher = erase(fetcher);
        let fetch = {
            let mut slots = self.inner.lock();
            let slot = self.inner.slot(&mut slots, key);
            slot.fetcher = Some(Arc::clone(&fetcher));

            if !slot.stale {
                if let Some(data) = &slot.data {
                    debug!(key = %key, "Cache hit");
                    return downcast(key, Arc::clone(data));
                }
            }

            if let Some(flight) = &slot.in_flight {
                debug!(key = %key, flight = flight.id, "Joining in-flight fetch");
                flight.fetch.clone()
            } else {
                debug!(key = %key, stale = slot.stale, "Cache miss");
                self.inner.start_flight(key, slot, fetcher)
            }
        };

        let value = fetch.await?;
        downcast(key, value)
    }

    /// Remembers `fetcher` for `key` without fetching.
    ///
    /// Lets the background refresher and invalidation refetch a key that has
    /// not been read yet.
    pub fn register<T, F, Fut>(&self, key: &QueryKey, fetcher: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        let mut slots = self.inner.lock();
        self.inner.slot(&mut slots, key).fetcher = Some(erase(fetcher));
    }

    /// Fetches `key` now, whether or not it is fresh.
    ///
    /// Joins a running fetch if there is one. Returns `Ok(false)` when the
    /// key has no registered fetcher.
    pub async fn refetch(&self, key: &QueryKey) -> Result<bool, StoreError> {
        let fetch = {
            let mut slots = self.inner.lock();
            let Some(slot) = slots.get_mut(key) else {
                return Ok(false);
            };
            if let Some(flight) = &slot.in_flight {
                flight.fetch.clone()
            } else if let Some(fetcher) = slot.fetcher.clone() {
                self.inner.start_flight(key, slot, fetcher)
            } else {
                return Ok(false);
            }
        };
        fetch.await?;
        Ok(true)
    }

    /// Marks every entry matching any of `prefixes` stale.
    ///
    /// Entries with at least one subscriber are refetched immediately in the
    /// background; the rest are refetched on their next read. Returns the
    /// number of entries invalidated.
    pub fn invalidate(&self, prefixes: &[QueryKeyPrefix]) -> usize {
        if prefixes.is_empty() {
            return 0;
        }

        let mut slots = self.inner.lock();
        let mut invalidated = 0;
        for (key, slot) in slots.iter_mut() {
            if !key.matches_any(prefixes) {
                continue;
            }
            invalidated += 1;
            slot.stale = true;
            slot.in_flight = None;
            slot.status.send_modify(|status| {
                status.stale = true;
                status.fetching = false;
            });

            if slot.subscribers == 0 {
                continue;
            }
            match slot.fetcher.clone() {
                Some(fetcher) => {
                    let fetch = self.inner.start_flight(key, slot, fetcher);
                    spawn_refetch(key.clone(), fetch);
                }
                None => debug!(key = %key, "Subscribed entry has no fetcher yet"),
            }
        }

        debug!(
            prefixes = prefixes.len(),
            invalidated, "Invalidated cache entries"
        );
        invalidated
    }

    /// Subscribes to `key`, creating the entry if needed.
    ///
    /// While the returned handle lives, invalidating the key triggers an
    /// immediate refetch and the handle observes the status transitions.
    pub fn subscribe(&self, key: &QueryKey) -> Subscription {
        let mut slots = self.inner.lock();
        let slot = self.inner.slot(&mut slots, key);
        slot.subscribers += 1;
        Subscription {
            key: key.clone(),
            cache: Arc::downgrade(&self.inner),
            status: slot.status.subscribe(),
        }
    }

    /// Returns the last stored value for `key`, fresh or stale.
    ///
    /// For rendering while a refetch runs; never triggers a fetch.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let slots = self.inner.lock();
        let data = slots.get(key)?.data.clone()?;
        data.downcast::<T>().ok()
    }

    /// Returns a snapshot of one entry.
    pub fn info(&self, key: &QueryKey) -> Option<EntryInfo> {
        self.inner.lock().get(key).map(|slot| slot.info(key))
    }

    /// Returns snapshots of every entry.
    pub fn entries(&self) -> Vec<EntryInfo> {
        self.inner
            .lock()
            .iter()
            .map(|(key, slot)| slot.info(key))
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn erase<T, F, Fut>(fetcher: F) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
{
    Arc::new(move || {
        let fetch = fetcher();
        async move {
            fetch
                .await
                .map(|value| Arc::new(value) as AnyValue)
                .map_err(Arc::new)
        }
        .boxed()
    })
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, StoreError> {
    value.downcast::<T>().map_err(|_| StoreError::TypeMismatch {
        key: key.to_string(),
    })
}

/// Drives a refetch nobody is awaiting.
fn spawn_refetch(key: QueryKey, fetch: SharedFetch) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        debug!(key = %key, "No runtime, refetch runs on next read");
        return;
    };
    handle.spawn(async move {
        if let Err(err) = fetch.await {
            warn!(key = %key, error = %err, "Refetch after invalidation failed");
        }
    });
}

// ============================================================================
// Subscription
// ============================================================================

/// Live interest in one key. Dropping it unsubscribes.
pub struct Subscription {
    key: QueryKey,
    cache: Weak<CacheInner>,
    status: watch::Receiver<EntryStatus>,
}

impl Subscription {
    /// Key this subscription watches.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current status of the entry.
    pub fn status(&self) -> EntryStatus {
        self.status.borrow().clone()
    }

    /// Waits for the next status change.
    ///
    /// Returns false once the entry is gone.
    pub async fn changed(&mut self) -> bool {
        self.status.changed().await.is_ok()
    }

    /// Waits until the entry has stored at least `version`, or failed.
    pub async fn wait_for_version(&mut self, version: u64) -> EntryStatus {
        loop {
            {
                let status = self.status.borrow_and_update();
                let failed = status.error.is_some() && !status.fetching;
                if status.version >= version || failed {
                    return status.clone();
                }
            }
            if !self.changed().await {
                return self.status();
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(cache) = self.cache.upgrade() else {
            return;
        };
        let mut slots = cache.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.subscribers = slot.subscribers.saturating_sub(1);
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
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Fetcher returning the call number, counting calls.
    fn counting(calls: &Arc<AtomicUsize>) -> impl Fn() -> BoxFuture<'static, Result<usize, RequestError>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            let calls = Arc::clone(&calls);
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_coalesce() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::startups();

        let slow = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, RequestError>(vec!["acme".to_string()])
                }
            }
        };

        let (a, b, c) = tokio::join!(
            cache.read(&key, slow.clone()),
            cache.read(&key, slow.clone()),
            cache.read(&key, slow),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetcher() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::unread_count();

        assert_eq!(*cache.read(&key, counting(&calls)).await.unwrap(), 1);
        assert_eq!(*cache.read(&key, counting(&calls)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let info = cache.info(&key).unwrap();
        assert!(!info.stale);
        assert!(info.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_marks_stale_until_refetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::analyses("s1");

        cache.read(&key, counting(&calls)).await.unwrap();
        assert_eq!(cache.invalidate(&[key.clone()]), 1);

        let info = cache.info(&key).unwrap();
        assert!(info.stale);
        assert!(!info.fetching);
        // Last-known value stays available while stale.
        assert_eq!(cache.peek::<usize>(&key).as_deref(), Some(&1));

        assert_eq!(*cache.read(&key, counting(&calls)).await.unwrap(), 2);
        assert!(!cache.info(&key).unwrap().stale);
    }

    #[tokio::test]
    async fn test_invalidate_only_matching_prefixes() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for key in [keys::analyses("s1"), keys::analyses("s2"), keys::unread_count()] {
            cache.read(&key, counting(&calls)).await.unwrap();
        }

        assert_eq!(cache.invalidate(&[keys::analyses("s1")]), 1);
        assert!(cache.info(&keys::analyses("s1")).unwrap().stale);
        assert!(!cache.info(&keys::analyses("s2")).unwrap().stale);
        assert!(!cache.info(&keys::unread_count()).unwrap().stale);

        assert_eq!(cache.invalidate(&[]), 0);
    }

    #[tokio::test]
    async fn test_subscribed_entry_refetches_immediately() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::notifications(false);

        let mut sub = cache.subscribe(&key);
        cache.read(&key, counting(&calls)).await.unwrap();
        assert_eq!(sub.status().version, 1);

        cache.invalidate(&[launchpad_core::Domain::Notifications.key()]);
        let status = sub.status();
        assert!(status.stale);
        assert!(status.fetching);

        let status = sub.wait_for_version(2).await;
        assert_eq!(status.version, 2);
        assert!(!status.stale);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek::<usize>(&key).as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_unsubscribed_entry_refetches_lazily() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::questions("s1");

        let sub = cache.subscribe(&key);
        cache.read(&key, counting(&calls)).await.unwrap();
        drop(sub);
        assert_eq!(cache.info(&key).unwrap().subscriber_count, 0);

        cache.invalidate(&[key.clone()]);
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.info(&key).unwrap().fetching);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::startup("s1");

        let flaky = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RequestError::Http {
                            status: 503,
                            message: "HTTP 503".into(),
                        })
                    } else {
                        Ok("ok".to_string())
                    }
                }
            }
        };

        let err = cache.read(&key, flaky.clone()).await.unwrap_err();
        assert_eq!(err.request().and_then(RequestError::status), Some(503));
        assert!(!cache.info(&key).unwrap().has_data);

        assert_eq!(cache.read(&key, flaky).await.unwrap().as_str(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_overwrite() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let key = keys::startups();

        // First call blocks on the gate, later calls return at once.
        let gated = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                let calls = Arc::clone(&calls);
                let gate = Arc::clone(&gate);
                async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if call == 1 {
                        gate.notified().await;
                    }
                    Ok::<_, RequestError>(call)
                }
            }
        };

        let early = tokio::spawn({
            let cache = cache.clone();
            let key = key.clone();
            let gated = gated.clone();
            async move { cache.read(&key, gated).await }
        });
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        cache.invalidate(&[key.clone()]);
        assert_eq!(*cache.read(&key, gated).await.unwrap(), 2);

        gate.notify_one();
        assert_eq!(*early.await.unwrap().unwrap(), 1);

        assert_eq!(cache.peek::<usize>(&key).as_deref(), Some(&2));
        assert!(!cache.info(&key).unwrap().stale);
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::unread_count();

        cache.read(&key, counting(&calls)).await.unwrap();
        let err = cache
            .read(&key, || async { Ok::<_, RequestError>("text".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert!(cache.peek::<String>(&key).is_none());
    }

    #[tokio::test]
    async fn test_refetch_forces_fetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::unread_count();

        assert!(!cache.refetch(&key).await.unwrap());

        cache.register(&key, counting(&calls));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.refetch(&key).await.unwrap());
        assert!(cache.refetch(&key).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek::<usize>(&key).as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_eviction_spares_subscribed_entries() {
        let cache = QueryCache::with_limit(Some(2));
        let calls = Arc::new(AtomicUsize::new(0));

        let _sub = cache.subscribe(&keys::startups());
        cache.read(&keys::startups(), counting(&calls)).await.unwrap();
        cache.read(&keys::startup("a"), counting(&calls)).await.unwrap();
        cache.read(&keys::startup("b"), counting(&calls)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.info(&keys::startups()).is_some());
        assert!(cache.info(&keys::startup("a")).is_none());
        assert!(cache.info(&keys::startup("b")).is_some());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_last_value() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::unread_count();

        let sometimes = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 => Ok(7u64),
                        _ => Err(RequestError::Http {
                            status: 500,
                            message: "HTTP 500".into(),
                        }),
                    }
                }
            }
        };

        let sub = cache.subscribe(&key);
        cache.read(&key, sometimes).await.unwrap();
        assert!(cache.refetch(&key).await.is_err());

        assert_eq!(cache.peek::<u64>(&key).as_deref(), Some(&7));
        assert_eq!(sub.status().error.as_deref(), Some("HTTP 500: HTTP 500"));
        assert_eq!(sub.status().version, 1);
    }
}
