use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::UpstreamError;

/// Base URL of the public Ginko API.
pub const DEFAULT_BASE_URL: &str = "https://api.ginko.voyage";

/// Upper bound on one upstream call, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const API_KEY_PARAM: &str = "apiKey";
const ENVELOPE_FIELD: &str = "objets";
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// Shared secret sent with every upstream call.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(SmolStr);

impl ApiKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl std::str::FromStr for ApiKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Expected shape of the payload under the `objets` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A JSON array.
    Sequence,
    /// Any JSON value, `null` included.
    Any,
}

impl Shape {
    fn check(self, payload: &Value) -> Result<(), &'static str> {
        match (self, payload) {
            (Shape::Sequence, Value::Array(_)) | (Shape::Any, _) => Ok(()),
            (Shape::Sequence, _) => Err("`objets` is not a sequence"),
        }
    }
}

/// HTTP client bound to one upstream API and key.
///
/// Connections are pooled and kept alive between calls. Cloning is cheap and
/// shares the pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: Url,
    api_key: ApiKey,
}

impl UpstreamClient {
    /// Creates a client for `base_url`.
    ///
    /// `timeout` bounds every call from connection to the last body byte.
    pub fn new(base_url: Url, api_key: ApiKey, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
            api_key,
        })
    }

    /// Base URL calls are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GETs `path` with `params` and parses the body as JSON.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(path, params)?;
        let started = Instant::now();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| UpstreamError::transport(path, error))?;

        let status = response.status();
        debug!(
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );
        if !status.is_success() {
            return Err(UpstreamError::Status {
                path: path.into(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| UpstreamError::transport(path, error))?;
        serde_json::from_slice(&body)
            .map_err(|error| UpstreamError::malformed(path, format!("invalid JSON: {error}")))
    }

    /// Like [`UpstreamClient::get_json`], returning the payload under the
    /// `objets` envelope after checking it has the expected `shape`.
    pub async fn get_objects(
        &self,
        path: &str,
        params: &[(&str, &str)],
        shape: Shape,
    ) -> Result<Value, UpstreamError> {
        let mut body = self.get_json(path, params).await?;
        let payload = body
            .get_mut(ENVELOPE_FIELD)
            .map(Value::take)
            .ok_or_else(|| UpstreamError::malformed(path, "missing `objets` field"))?;
        shape
            .check(&payload)
            .map_err(|reason| UpstreamError::malformed(path, reason))?;
        Ok(payload)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| UpstreamError::InvalidPath {
                path: path.into(),
                reason: error.to_string().into(),
            })?;
        url.query_pairs_mut()
            .append_pair(API_KEY_PARAM, self.api_key.expose())
            .extend_pairs(params);
        Ok(url)
    }
}

// `Url::join` replaces the last segment of a base without a trailing slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
