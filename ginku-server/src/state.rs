use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ginku::{Cache, CachePolicy};
use ginku_reqwest::{UpstreamClient, UpstreamError};
use tokio::sync::watch;

use crate::config::Ttls;
use crate::operation::Freshness;

/// Serialized `objets` payloads, keyed by operation and parameters.
pub type ResponseCache = Cache<Bytes, UpstreamError>;

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    cache: ResponseCache,
    client: UpstreamClient,
    ttls: Ttls,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Creates the state with an empty cache.
    pub fn new(client: UpstreamClient, ttls: Ttls) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            cache: Cache::new(CachePolicy::new(ttls.default)),
            client,
            ttls,
            shutdown: Arc::new(shutdown),
        }
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The upstream client.
    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// TTL override for `freshness`; `None` uses the cache policy.
    pub fn ttl_override(&self, freshness: Freshness) -> Option<Duration> {
        match freshness {
            Freshness::Default => None,
            Freshness::Realtime => Some(self.ttls.realtime),
        }
    }

    /// Makes every pending and future handler give up waiting on upstream.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`AppState::shutdown`] has been called.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut shutdown = self.shutdown.subscribe();
        async move {
            // The sender lives as long as any state clone.
            let _ = shutdown.wait_for(|stopping| *stopping).await;
        }
    }
}
