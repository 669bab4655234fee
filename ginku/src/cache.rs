use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use ginku_core::{CacheKey, CacheState, CacheStatus, CacheValue, Fetcher};
use tokio::time::Instant;
use tracing::{Instrument, debug, info_span, trace};

use crate::error::CacheError;
use crate::inflight::{InFlight, InFlightGuard, Registration, SharedFetch};
use crate::metrics;
use crate::policy::CachePolicy;
use crate::store::CacheStore;

/// A value returned by the orchestrator along with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    value: V,
    status: CacheStatus,
}

impl<V> Fetched<V> {
    /// Wraps a value obtained with `status`.
    pub fn new(value: V, status: CacheStatus) -> Self {
        Self { value, status }
    }

    /// Returns a reference to the value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns whether the value was a hit, a miss or a joined call.
    pub fn status(&self) -> CacheStatus {
        self.status
    }

    /// Consumes the wrapper and returns the value.
    pub fn into_inner(self) -> V {
        self.value
    }
}

/// TTL response cache with in-flight request coalescing.
///
/// `V` is the cached payload, `E` the fetchers' error type. Both are shared
/// between every caller joined on one upstream call, hence `Clone`.
///
/// For a given key:
/// 1. a value younger than the reader's TTL is returned without calling upstream;
/// 2. otherwise, if an upstream call is pending, the caller joins it;
/// 3. otherwise the caller's fetcher runs in a new task. A success is stored
///    before the in-flight registration is released; a failure is never stored.
///
/// At most one upstream call is pending per key, and every caller joined on
/// it observes the same outcome.
///
/// The fetcher runs in its own task, so callers that stop waiting (dropped
/// futures, [`Cache::fetch_cancellable`]) never abort the call for the callers
/// still joined on it. Cloning a `Cache` is cheap and yields a handle to the
/// same stores.
pub struct Cache<V, E> {
    store: Arc<CacheStore<V>>,
    inflight: Arc<InFlight<V, E>>,
    policy: CachePolicy,
}

impl<V, E> Clone for Cache<V, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            inflight: Arc::clone(&self.inflight),
            policy: self.policy.clone(),
        }
    }
}

impl<V, E> std::fmt::Debug for Cache<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy)
            .field("entries", &self.store.len())
            .field("in_flight", &self.inflight.len())
            .finish()
    }
}

impl<V, E> Default for Cache<V, E> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl<V, E> Cache<V, E> {
    /// Creates an empty cache with the given policy.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            store: Arc::new(CacheStore::default()),
            inflight: Arc::new(InFlight::default()),
            policy,
        }
    }

    /// Whether an upstream call is currently pending for `key`.
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inflight.contains(key)
    }

    /// Drops the cached entry for `key`. Returns `true` if one existed.
    ///
    /// A call pending for `key` is not affected and stores its result when it
    /// completes.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.store.delete(key);
        debug!(%key, removed, "cache entry invalidated");
        removed
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.store.clear();
        debug!("cache cleared");
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V, E> Cache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Returns the stored entry for `key`, fresh or not.
    pub fn cached(&self, key: &CacheKey) -> Option<CacheValue<V>> {
        self.store.get(key)
    }

    /// Returns the value for `key`, from the cache or from `fetcher`.
    ///
    /// `ttl` overrides the policy's default TTL for this read.
    pub async fn fetch_with_cache<F>(
        &self,
        key: CacheKey,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> Result<V, CacheError<E>>
    where
        F: Fetcher<Value = V, Error = E> + Send + 'static,
    {
        self.fetch(key, fetcher, ttl).await.map(Fetched::into_inner)
    }

    /// Like [`Cache::fetch_with_cache`], also reporting how the value was obtained.
    pub async fn fetch<F>(
        &self,
        key: CacheKey,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> Result<Fetched<V>, CacheError<E>>
    where
        F: Fetcher<Value = V, Error = E> + Send + 'static,
    {
        let ttl = ttl.unwrap_or(self.policy.ttl);

        if let Some(value) = self.lookup(&key, ttl) {
            return Ok(self.hit(&key, value));
        }

        let (status, pending) = match self.inflight.get(&key) {
            Some(pending) => (CacheStatus::Joined, pending),
            None => {
                let registration = self.inflight.join_or_register(&key, |id| {
                    // A call may have settled since the first lookup.
                    match self.lookup(&key, ttl) {
                        Some(value) => Err(value),
                        None => Ok(self.spawn_fetch(key.clone(), id, fetcher)),
                    }
                });
                match registration {
                    Registration::Skipped(value) => return Ok(self.hit(&key, value)),
                    Registration::Joined(pending) => (CacheStatus::Joined, pending),
                    Registration::Started(pending) => (CacheStatus::Miss, pending),
                }
            }
        };

        match status {
            CacheStatus::Joined => debug!(%key, "joining in-flight upstream call"),
            _ => debug!(%key, ttl_ms = ttl.as_millis() as u64, "cache miss"),
        }
        metrics::record_status(status);

        pending.await.map(|value| Fetched::new(value, status))
    }

    /// Like [`Cache::fetch`], but gives up as soon as `cancel` resolves.
    ///
    /// Cancellation only detaches this caller: it receives
    /// [`CacheError::Cancelled`], while the upstream call keeps running for
    /// other joined callers and still populates the cache. Callers that hit a
    /// fresh entry are never cancelled.
    pub async fn fetch_cancellable<F, C>(
        &self,
        key: CacheKey,
        fetcher: F,
        ttl: Option<Duration>,
        cancel: C,
    ) -> Result<Fetched<V>, CacheError<E>>
    where
        F: Fetcher<Value = V, Error = E> + Send + 'static,
        C: Future<Output = ()>,
    {
        if let Some(value) = self.lookup(&key, ttl.unwrap_or(self.policy.ttl)) {
            return Ok(self.hit(&key, value));
        }

        let cancelled_key = key.clone();
        tokio::select! {
            biased;
            () = cancel => {
                debug!(key = %cancelled_key, "caller cancelled");
                Err(CacheError::Cancelled { key: cancelled_key })
            }
            result = self.fetch(key, fetcher, ttl) => result,
        }
    }

    fn lookup(&self, key: &CacheKey, ttl: Duration) -> Option<V> {
        match self.store.get(key)?.cache_state(ttl) {
            CacheState::Actual(value) => Some(value.into_inner()),
            CacheState::Expired(value) => {
                trace!(%key, age_ms = value.age().as_millis() as u64, "cached entry expired");
                None
            }
        }
    }

    fn hit(&self, key: &CacheKey, value: V) -> Fetched<V> {
        debug!(%key, "cache hit");
        metrics::record_status(CacheStatus::Hit);
        Fetched::new(value, CacheStatus::Hit)
    }

    /// Runs `fetcher` in its own task and returns a shareable handle to its outcome.
    ///
    /// The task owns the in-flight guard: the registration is released after
    /// the value is stored, or as soon as the call fails or panics.
    fn spawn_fetch<F>(&self, key: CacheKey, id: u64, fetcher: F) -> SharedFetch<V, E>
    where
        F: Fetcher<Value = V, Error = E> + Send + 'static,
    {
        let guard = InFlightGuard::new(Arc::clone(&self.inflight), key.clone(), id);
        let store = Arc::clone(&self.store);
        let span = info_span!("upstream_fetch", key = %key);
        let task_key = key.clone();

        let handle = tokio::spawn(
            async move {
                let _guard = guard;
                let started = Instant::now();
                let result = fetcher.fetch().await;
                let elapsed = started.elapsed();
                metrics::record_upstream(elapsed, result.is_ok());

                match &result {
                    Ok(value) => {
                        store.set(task_key, value.clone());
                        debug!(elapsed_ms = elapsed.as_millis() as u64, "upstream value stored");
                    }
                    Err(_) => {
                        debug!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            "upstream call failed, nothing stored"
                        );
                    }
                }
                result
            }
            .instrument(span),
        );

        async move {
            match handle.await {
                Ok(result) => result.map_err(CacheError::Upstream),
                Err(error) => Err(CacheError::Aborted {
                    key,
                    reason: error.to_string().into(),
                }),
            }
        }
        .boxed()
        .shared()
    }
}
