//! How a value was obtained by the orchestrator.

/// Whether a value came from the cache, from a fresh upstream call, or from
/// an upstream call started by another caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// A fresh cached entry was returned.
    Hit,
    /// This caller started the upstream call.
    #[default]
    Miss,
    /// This caller joined an upstream call already in flight for the same key.
    Joined,
}

impl CacheStatus {
    /// Returns the status as a lowercase string slice, for logs and metric labels.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Joined => "joined",
        }
    }

    /// Returns the status as an uppercase header value (`HIT`, `MISS`, `JOINED`).
    #[inline]
    pub const fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Joined => "JOINED",
        }
    }
}
