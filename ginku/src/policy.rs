use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time-to-live applied when a caller supplies none.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Process-wide cache policy.
///
/// ```
/// use std::time::Duration;
/// use ginku::CachePolicy;
///
/// let policy: CachePolicy = serde_json::from_str(r#"{ "ttl": "30s" }"#).unwrap();
/// assert_eq!(policy.ttl, Duration::from_secs(30));
/// assert_eq!(CachePolicy::default().ttl, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CachePolicy {
    /// Time-to-live used by readers that don't pass their own (e.g. "60s", "500ms", "1m").
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

impl CachePolicy {
    /// Creates a policy with the given default TTL.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}
