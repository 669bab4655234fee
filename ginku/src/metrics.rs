//! Metrics declaration and recording.

use std::time::Duration;

use ginku_core::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "ginku_cache_hit_total",
            "Total number of cache hit events."
        );
        "ginku_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "ginku_cache_miss_total",
            "Total number of cache miss events."
        );
        "ginku_cache_miss_total"
    };
    /// Track number of requests coalesced onto an in-flight upstream call.
    pub static ref CACHE_JOINED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "ginku_cache_joined_total",
            "Total number of requests that joined an in-flight upstream call."
        );
        "ginku_cache_joined_total"
    };
    /// Histogram of upstream call durations.
    pub static ref UPSTREAM_DURATION: &'static str = {
        metrics::describe_histogram!(
            "ginku_upstream_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of upstream calls in seconds."
        );
        "ginku_upstream_duration_seconds"
    };
    /// Track number of failed upstream calls.
    pub static ref UPSTREAM_ERRORS: &'static str = {
        metrics::describe_counter!(
            "ginku_upstream_errors_total",
            "Total number of failed upstream calls."
        );
        "ginku_upstream_errors_total"
    };
}

/// Records how a request was served.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_status(status: CacheStatus) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Joined => *CACHE_JOINED_COUNTER,
    };
    metrics::counter!(counter).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_status(_status: CacheStatus) {}

/// Records the duration and outcome of one upstream call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_upstream(duration: Duration, success: bool) {
    let outcome = if success { "success" } else { "error" };
    metrics::histogram!(*UPSTREAM_DURATION, "outcome" => outcome).record(duration.as_secs_f64());
    if !success {
        metrics::counter!(*UPSTREAM_ERRORS).increment(1);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_upstream(_duration: Duration, _success: bool) {}
