//! In-flight request tracking for request coalescing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, Shared};
use ginku_core::CacheKey;
use tracing::trace;

use crate::CacheError;

/// A pending upstream call that any number of callers can await.
pub(crate) type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, CacheError<E>>>>;

struct Pending<V, E> {
    id: u64,
    fetch: SharedFetch<V, E>,
}

/// Outcome of [`InFlight::join_or_register`].
pub(crate) enum Registration<V, E, T> {
    /// A call was already pending for the key.
    Joined(SharedFetch<V, E>),
    /// No call was pending; the caller's call is now registered.
    Started(SharedFetch<V, E>),
    /// No call was pending and the caller chose not to start one.
    Skipped(T),
}

/// Mapping from cache key to the upstream call currently pending for it.
///
/// At most one call is registered per key. The registration made by a call
/// is removed by its [`InFlightGuard`] once the call settles, whatever the
/// outcome.
pub(crate) struct InFlight<V, E> {
    entries: DashMap<CacheKey, Pending<V, E>>,
    next_id: AtomicU64,
}

impl<V, E> Default for InFlight<V, E> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<V, E> InFlight<V, E> {
    pub(crate) fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes the registration for `key` if it still belongs to call `id`.
    pub(crate) fn release(&self, key: &CacheKey, id: u64) {
        if self.entries.remove_if(key, |_, pending| pending.id == id).is_some() {
            trace!(%key, id, "in-flight entry released");
        }
    }
}

impl<V: Clone, E: Clone> InFlight<V, E> {
    pub(crate) fn get(&self, key: &CacheKey) -> Option<SharedFetch<V, E>> {
        self.entries.get(key).map(|pending| pending.fetch.clone())
    }

    /// Joins the call pending for `key`, or lets `start` register a new one.
    ///
    /// The lookup and the registration happen under the key's shard lock, so
    /// two callers can never both observe an empty slot. `start` receives the
    /// registration id to hand to its [`InFlightGuard`]; it must not block and
    /// must not touch this tracker.
    pub(crate) fn join_or_register<T, F>(&self, key: &CacheKey, start: F) -> Registration<V, E, T>
    where
        F: FnOnce(u64) -> Result<SharedFetch<V, E>, T>,
    {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => Registration::Joined(entry.get().fetch.clone()),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                match start(id) {
                    Ok(fetch) => {
                        slot.insert(Pending {
                            id,
                            fetch: fetch.clone(),
                        });
                        Registration::Started(fetch)
                    }
                    Err(skipped) => Registration::Skipped(skipped),
                }
            }
        }
    }
}

/// Releases an in-flight registration when dropped.
///
/// Owned by the task running the upstream call, so the registration is
/// released on success, failure and panic alike.
pub(crate) struct InFlightGuard<V, E> {
    inflight: Arc<InFlight<V, E>>,
    key: CacheKey,
    id: u64,
}

impl<V, E> InFlightGuard<V, E> {
    pub(crate) fn new(inflight: Arc<InFlight<V, E>>, key: CacheKey, id: u64) -> Self {
        Self { inflight, key, id }
    }
}

impl<V, E> Drop for InFlightGuard<V, E> {
    fn drop(&mut self) {
        self.inflight.release(&self.key, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    type Tracker = InFlight<u32, ()>;

    fn ready(value: u32) -> SharedFetch<u32, ()> {
        async move { Ok::<_, CacheError<()>>(value) }.boxed().shared()
    }

    #[tokio::test]
    async fn second_caller_joins_first_registration() {
        let tracker = Tracker::default();
        let key = CacheKey::from("getLignes");

        let first = tracker.join_or_register::<(), _>(&key, |_| Ok(ready(1)));
        assert!(matches!(first, Registration::Started(_)));

        let second = tracker.join_or_register::<(), _>(&key, |_| Ok(ready(2)));
        let Registration::Joined(fetch) = second else {
            panic!("second caller should join");
        };
        assert!(matches!(fetch.await, Ok(1)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn skipped_start_registers_nothing() {
        let tracker = Tracker::default();
        let key = CacheKey::from("getArrets");

        let outcome = tracker.join_or_register(&key, |_| Err("fresh in store"));
        assert!(matches!(outcome, Registration::Skipped("fresh in store")));
        assert!(!tracker.contains(&key));
    }

    #[test]
    fn guard_releases_only_its_own_registration() {
        let tracker = Arc::new(Tracker::default());
        let key = CacheKey::from("getEtatLignes");

        let mut first_id = None;
        let _ = tracker.join_or_register::<(), _>(&key, |id| {
            first_id = Some(id);
            Ok(ready(1))
        });
        let first_id = first_id.unwrap();

        // A stale guard for an older registration must not evict the current one.
        drop(InFlightGuard::new(Arc::clone(&tracker), key.clone(), first_id + 100));
        assert!(tracker.contains(&key));
        assert!(tracker.get(&key).is_some());

        drop(InFlightGuard::new(Arc::clone(&tracker), key.clone(), first_id));
        assert!(!tracker.contains(&key));
    }
}
