use ginku_core::CacheKey;
use smol_str::SmolStr;
use thiserror::Error;

/// Error type for orchestrated fetches.
///
/// `CacheError` is `Clone` so that a single failed upstream call can be
/// delivered, identically, to every caller joined on it. `E` is the fetcher's
/// own error type and must be cloneable for the same reason.
#[derive(Debug, Clone, Error)]
pub enum CacheError<E> {
    /// The fetcher failed. Nothing was cached.
    #[error(transparent)]
    Upstream(E),

    /// The task running the fetcher did not complete (it panicked, or the
    /// runtime shut down under it). Nothing was cached.
    #[error("fetch task for `{key}` aborted: {reason}")]
    Aborted {
        /// Key of the aborted fetch.
        key: CacheKey,
        /// Description of the task failure.
        reason: SmolStr,
    },

    /// The caller stopped waiting before the value was ready.
    ///
    /// Only the cancelling caller sees this; the fetch keeps running for the
    /// other callers joined on the same key.
    #[error("request for `{key}` cancelled")]
    Cancelled {
        /// Key the caller was waiting on.
        key: CacheKey,
    },
}

impl<E> CacheError<E> {
    /// Returns the fetcher's error, if this is an upstream failure.
    pub fn upstream(&self) -> Option<&E> {
        match self {
            CacheError::Upstream(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the caller cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled { .. })
    }
}
