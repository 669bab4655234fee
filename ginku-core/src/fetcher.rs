use std::future::Future;

/// Produces a value for a cache key on a miss.
///
/// A fetcher is consumed by the call: the orchestrator invokes it at most once
/// and only when neither a fresh cached value nor an in-flight call exists for
/// the key. Any `FnOnce` closure returning a `Send` future of a `Result` is a
/// fetcher.
///
/// # Examples
///
/// ```rust
/// use ginku_core::Fetcher;
///
/// fn lines() -> impl Fetcher<Value = Vec<&'static str>, Error = std::io::Error> {
///     || async { Ok::<_, std::io::Error>(vec!["L1", "L2"]) }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// assert_eq!(lines().fetch().await.unwrap(), vec!["L1", "L2"]);
/// # }
/// ```
pub trait Fetcher {
    /// The value produced on success.
    type Value;

    /// The error produced on failure.
    type Error;

    /// The future resolving to the fetched value.
    type Future: Future<Output = Result<Self::Value, Self::Error>> + Send;

    /// Performs the fetch.
    fn fetch(self) -> Self::Future;
}

impl<F, Fut, T, E> Fetcher for F
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send,
{
    type Value = T;
    type Error = E;
    type Future = Fut;

    fn fetch(self) -> Self::Future {
        self()
    }
}
