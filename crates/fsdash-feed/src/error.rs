use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Timeout, DNS failure, refused connection, or a broken body stream.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {url}")]
    Upstream { status: u16, url: String },

    /// Body is not JSON, or is JSON without a `features` array.
    #[error("malformed response from {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Coarse failure class, so callers can branch without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Upstream,
    MalformedResponse,
}

impl FeedError {
    #[must_use]
    pub fn category(&self) -> FailureKind {
        match self {
            // A URL that cannot be requested at all behaves like an
            // unreachable host from the dashboard's point of view.
            FeedError::Network(_) | FeedError::InvalidEndpoint { .. } => FailureKind::Network,
            FeedError::Upstream { .. } => FailureKind::Upstream,
            FeedError::MalformedResponse { .. } => FailureKind::MalformedResponse,
        }
    }
}
