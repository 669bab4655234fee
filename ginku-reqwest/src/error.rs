use std::sync::Arc;

use http::StatusCode;
use smol_str::SmolStr;
use thiserror::Error;

/// A failed call to the upstream API.
///
/// Messages name the upstream path but never the request URL, which carries
/// the API key.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The upstream could not be reached, or the call timed out.
    #[error("upstream {path} unreachable: {source}")]
    Transport {
        /// Upstream path of the call.
        path: SmolStr,
        /// Underlying client error, stripped of its URL.
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The upstream answered with a non-success status.
    #[error("upstream {path} answered {status}")]
    Status {
        /// Upstream path of the call.
        path: SmolStr,
        /// Status returned by the upstream.
        status: StatusCode,
    },

    /// The upstream answered 2xx with a payload of the wrong shape.
    #[error("malformed response from upstream {path}: {reason}")]
    Malformed {
        /// Upstream path of the call.
        path: SmolStr,
        /// What was wrong with the payload.
        reason: SmolStr,
    },

    /// The request URL could not be built.
    #[error("invalid upstream path {path}: {reason}")]
    InvalidPath {
        /// Upstream path of the call.
        path: SmolStr,
        /// Parser message.
        reason: SmolStr,
    },
}

impl UpstreamError {
    pub(crate) fn transport(path: &str, error: reqwest::Error) -> Self {
        Self::Transport {
            path: path.into(),
            source: Arc::new(error.without_url()),
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<SmolStr>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the call failed because the client timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    /// Whether the upstream answered, but with an unusable payload.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
