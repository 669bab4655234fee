//! Orchestrator behaviour: TTL reads, coalescing, failures and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ginku::{Cache, CacheError, CacheKey, CachePolicy, CacheStatus, Fetcher};
use tokio::sync::{Barrier, oneshot};
use tokio::time::{advance, sleep};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum TestError {
    #[error("connection refused")]
    Transport,
}

type Lines = Vec<String>;

fn lines() -> Lines {
    vec!["L1".to_string(), "L2".to_string()]
}

fn cache(ttl: Duration) -> Cache<Lines, TestError> {
    Cache::new(CachePolicy::new(ttl))
}

fn succeed(
    calls: &Arc<AtomicUsize>,
    value: Lines,
) -> impl Fetcher<Value = Lines, Error = TestError> + Send + 'static {
    let calls = Arc::clone(calls);
    move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

fn slow(
    calls: &Arc<AtomicUsize>,
    delay: Duration,
) -> impl Fetcher<Value = Lines, Error = TestError> + Send + 'static {
    let calls = Arc::clone(calls);
    move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        sleep(delay).await;
        Ok(lines())
    }
}

fn fail(
    calls: &Arc<AtomicUsize>,
) -> impl Fetcher<Value = Lines, Error = TestError> + Send + 'static {
    let calls = Arc::clone(calls);
    move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(TestError::Transport)
    }
}

#[tokio::test(start_paused = true)]
async fn read_within_ttl_skips_fetcher() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("lines");

    let first = cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(first.status(), CacheStatus::Miss);

    advance(Duration::from_secs(59)).await;
    let second = cache
        .fetch(key.clone(), succeed(&calls, vec!["other".into()]), None)
        .await
        .unwrap();

    assert_eq!(second.status(), CacheStatus::Hit);
    assert_eq!(second.into_inner(), lines());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn lines_timeline() {
    let cache = cache(Duration::from_millis(60_000));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("lines");

    // t = 0
    let value = cache
        .fetch_with_cache(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(value, lines());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // t = 30s
    advance(Duration::from_millis(30_000)).await;
    let value = cache
        .fetch_with_cache(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(value, lines());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // t = 61s
    advance(Duration::from_millis(31_000)).await;
    let fetched = cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(fetched.status(), CacheStatus::Miss);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn each_reader_applies_its_own_ttl() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::builder("getTempsLieu")
        .part("nom", "Gare")
        .into_cache_key();
    let realtime = Some(Duration::from_secs(30));

    cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();

    advance(Duration::from_secs(20)).await;
    let relaxed = cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(relaxed.status(), CacheStatus::Hit);

    advance(Duration::from_secs(10)).await;
    let strict = cache
        .fetch(key.clone(), succeed(&calls, lines()), realtime)
        .await
        .unwrap();
    assert_eq!(strict.status(), CacheStatus::Miss);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The refreshed entry satisfies both readers again.
    let strict = cache
        .fetch(key.clone(), succeed(&calls, lines()), realtime)
        .await
        .unwrap();
    assert_eq!(strict.status(), CacheStatus::Hit);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_fetch() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getArrets");

    let requests = (0..10).map(|_| {
        cache.fetch(key.clone(), slow(&calls, Duration::from_millis(100)), None)
    });
    let results = futures::future::join_all(requests).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let statuses: Vec<_> = results
        .into_iter()
        .map(|result| {
            let fetched = result.unwrap();
            assert_eq!(fetched.value(), &lines());
            fetched.status()
        })
        .collect();
    let count = |status: CacheStatus| statuses.iter().filter(|s| **s == status).count();
    assert_eq!(count(CacheStatus::Miss), 1);
    assert_eq!(count(CacheStatus::Joined), 9);
    assert!(!cache.is_in_flight(&key));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_fetch_across_threads() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::builder("getVariantesDesservantArret")
        .part("idArret", "42")
        .into_cache_key();
    let barrier = Arc::new(Barrier::new(32));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let cache = cache.clone();
            let key = key.clone();
            let fetcher = slow(&calls, Duration::from_millis(50));
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                cache.fetch_with_cache(key, fetcher, None).await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), lines());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_is_not_cached_and_next_call_retries() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("stop-42");

    let error = cache
        .fetch_with_cache(key.clone(), fail(&calls), None)
        .await
        .unwrap_err();

    assert!(matches!(error, CacheError::Upstream(TestError::Transport)));
    assert!(cache.cached(&key).is_none());
    assert!(!cache.is_in_flight(&key));

    let value = cache
        .fetch_with_cache(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(value, lines());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn joined_callers_observe_the_same_failure() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getEtatLignes");

    let slow_failure = {
        let calls = Arc::clone(&calls);
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(100)).await;
            Err::<Lines, _>(TestError::Transport)
        }
    };
    let leader = cache.fetch(key.clone(), slow_failure, None);
    let followers = (0..4).map(|_| cache.fetch(key.clone(), fail(&calls), None));

    let (leader, followers) = tokio::join!(leader, futures::future::join_all(followers));

    assert!(matches!(leader, Err(CacheError::Upstream(TestError::Transport))));
    for follower in followers {
        assert_eq!(follower.unwrap_err().upstream(), Some(&TestError::Transport));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_caller_does_not_poison_joined_callers() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::builder("getDetailsVehicule")
        .part("num", "412")
        .into_cache_key();

    let (release_tx, release_rx) = oneshot::channel::<()>();
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    let gated = {
        let calls = Arc::clone(&calls);
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok::<_, TestError>(lines())
        }
    };

    let impatient = tokio::spawn({
        let cache = cache.clone();
        let key = key.clone();
        async move {
            let cancel = async move {
                let _ = cancel_rx.await;
            };
            cache.fetch_cancellable(key, gated, None, cancel).await
        }
    });
    while !cache.is_in_flight(&key) {
        tokio::task::yield_now().await;
    }

    let patient = tokio::spawn({
        let cache = cache.clone();
        let key = key.clone();
        let fetcher = succeed(&calls, vec!["unused".into()]);
        async move { cache.fetch(key, fetcher, None).await }
    });

    cancel_tx.send(()).unwrap();
    let impatient = impatient.await.unwrap();
    assert!(impatient.as_ref().is_err_and(CacheError::is_cancelled));
    assert!(cache.is_in_flight(&key));

    release_tx.send(()).unwrap();
    let patient = patient.await.unwrap().unwrap();
    assert_eq!(patient.status(), CacheStatus::Joined);
    assert_eq!(patient.into_inner(), lines());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.cached(&key).map(|entry| entry.into_inner()), Some(lines()));
}

#[tokio::test(start_paused = true)]
async fn fresh_entry_is_served_after_cancel_fired() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getLignes");

    cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();

    let fetched = cache
        .fetch_cancellable(key.clone(), fail(&calls), None, std::future::ready(()))
        .await
        .unwrap();
    assert_eq!(fetched.status(), CacheStatus::Hit);
    assert_eq!(fetched.into_inner(), lines());

    assert!(cache.invalidate(&key));
    let error = cache
        .fetch_cancellable(key, succeed(&calls, lines()), None, std::future::ready(()))
        .await
        .unwrap_err();
    assert!(error.is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_caller_leaves_fetch_running() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getLignes");

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        cache.fetch(key.clone(), slow(&calls, Duration::from_millis(100)), None),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(cache.is_in_flight(&key));

    sleep(Duration::from_millis(200)).await;
    assert!(!cache.is_in_flight(&key));

    let fetched = cache
        .fetch(key, succeed(&calls, Vec::new()), None)
        .await
        .unwrap();
    assert_eq!(fetched.status(), CacheStatus::Hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_fetcher_releases_registration() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getMessages");

    let exploding = || async {
        if true {
            panic!("upstream client bug");
        }
        Ok::<Lines, TestError>(Vec::new())
    };
    let error = cache
        .fetch_with_cache(key.clone(), exploding, None)
        .await
        .unwrap_err();

    assert!(matches!(error, CacheError::Aborted { .. }));
    assert!(!cache.is_in_flight(&key));
    assert!(cache.cached(&key).is_none());

    let value = cache
        .fetch_with_cache(key, succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(value, lines());
}

#[tokio::test(start_paused = true)]
async fn invalidate_forces_next_fetch() {
    let cache = cache(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::from("getArrets");

    cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert!(cache.invalidate(&key));
    assert!(!cache.invalidate(&key));

    cache
        .fetch(key.clone(), succeed(&calls, lines()), None)
        .await
        .unwrap();
    cache.clear();
    assert!(cache.is_empty());

    let fetched = cache
        .fetch(key, succeed(&calls, lines()), None)
        .await
        .unwrap();
    assert_eq!(fetched.status(), CacheStatus::Miss);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
