//! Mutations with declared cache invalidations.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use launchpad_core::QueryKeyPrefix;
use launchpad_fetch::RequestError;
use tracing::debug;

use crate::error::StoreError;
use crate::query_cache::QueryCache;

// ============================================================================
// Mutation Descriptor
// ============================================================================

/// A write call plus the key groups it may have changed.
pub struct MutationDescriptor<'a, T> {
    label: &'static str,
    execute: BoxFuture<'a, Result<T, RequestError>>,
    invalidates: Vec<QueryKeyPrefix>,
    serialize_on: Option<String>,
}

impl<'a, T> MutationDescriptor<'a, T> {
    /// Wraps the call. Nothing runs until the coordinator executes it.
    pub fn new<Fut>(label: &'static str, execute: Fut) -> Self
    where
        Fut: Future<Output = Result<T, RequestError>> + Send + 'a,
    {
        Self {
            label,
            execute: execute.boxed(),
            invalidates: Vec::new(),
            serialize_on: None,
        }
    }

    /// Adds a key group to invalidate on success.
    #[must_use]
    pub fn invalidates(mut self, prefix: QueryKeyPrefix) -> Self {
        self.invalidates.push(prefix);
        self
    }

    /// Adds several key groups to invalidate on success.
    #[must_use]
    pub fn invalidates_all(mut self, prefixes: impl IntoIterator<Item = QueryKeyPrefix>) -> Self {
        self.invalidates.extend(prefixes);
        self
    }

    /// Runs this mutation exclusively with other mutations on `resource_id`.
    #[must_use]
    pub fn serialize_on(mut self, resource_id: impl Into<String>) -> Self {
        self.serialize_on = Some(resource_id.into());
        self
    }

    /// Declared invalidation prefixes.
    pub fn invalidation_prefixes(&self) -> &[QueryKeyPrefix] {
        &self.invalidates
    }
}

impl<T> fmt::Debug for MutationDescriptor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationDescriptor")
            .field("label", &self.label)
            .field("invalidates", &self.invalidates)
            .field("serialize_on", &self.serialize_on)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Mutation Coordinator
// ============================================================================

type ResourceLock = Arc<tokio::sync::Mutex<()>>;

/// Executes mutations and applies their invalidations to the cache.
#[derive(Clone)]
pub struct MutationCoordinator {
    cache: QueryCache,
    locks: Arc<Mutex<HashMap<String, ResourceLock>>>,
}

impl fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl MutationCoordinator {
    /// Creates a coordinator invalidating `cache`.
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The cache this coordinator invalidates.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Executes `descriptor`.
    ///
    /// On success the declared prefixes are invalidated before this returns,
    /// so no caller can observe the mutation as done while matching entries
    /// still count as fresh. On failure nothing is invalidated and the error
    /// is returned as is.
    pub async fn mutate<T>(&self, descriptor: MutationDescriptor<'_, T>) -> Result<T, StoreError> {
        let MutationDescriptor {
            label,
            execute,
            invalidates,
            serialize_on,
        } = descriptor;

        let lease = serialize_on.as_deref().map(|id| ResourceLease::acquire(self, id));
        let guard = match &lease {
            Some(lease) => {
                debug!(mutation = label, resource = %lease.resource_id, "Waiting for resource lock");
                Some(lease.lock.lock().await)
            }
            None => None,
        };

        let result = execute.await;
        if result.is_ok() {
            let invalidated = self.cache.invalidate(&invalidates);
            debug!(mutation = label, invalidated, "Mutation succeeded");
        } else {
            debug!(mutation = label, "Mutation failed, nothing invalidated");
        }

        drop(guard);
        drop(lease);

        result.map_err(StoreError::from)
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A claim on one resource's mutex, held while waiting for and running a
/// serialized mutation. Dropping it, on completion or on cancellation of the
/// caller, removes the map entry once no other claim remains.
struct ResourceLease<'a> {
    locks: &'a Mutex<HashMap<String, ResourceLock>>,
    resource_id: &'a str,
    lock: ResourceLock,
}

impl<'a> ResourceLease<'a> {
    fn acquire(coordinator: &'a MutationCoordinator, resource_id: &'a str) -> Self {
        let mut locks = coordinator.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(locks.entry(resource_id.to_string()).or_default());
        Self {
            locks: &coordinator.locks,
            resource_id,
            lock,
        }
    }
}

impl Drop for ResourceLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by this lease.
        if Arc::strong_count(&self.lock) <= 2 {
            locks.remove(self.resource_id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
