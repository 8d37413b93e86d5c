use std::time::{Duration, Instant};

use fsdash_core::{AppConfig, ServiceKind};
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::types::{keys, Feature, FeatureCollection};

/// How many feature names [`FeedClient::probe`] reports.
const PROBE_SAMPLE_SIZE: usize = 5;

/// The fixed upstream URL for each kind.
#[derive(Debug, Clone)]
pub struct FeedEndpoints {
    pub ambulance: Url,
    pub fire_station: Url,
}

impl FeedEndpoints {
    /// Parses both URLs.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidEndpoint`] if either URL does not parse.
    pub fn parse(ambulance: &str, fire_station: &str) -> Result<Self, FeedError> {
        Ok(Self {
            ambulance: parse_url(ambulance)?,
            fire_station: parse_url(fire_station)?,
        })
    }

    #[must_use]
    pub fn url_for(&self, kind: ServiceKind) -> &Url {
        match kind {
            ServiceKind::AmbulanceDepot => &self.ambulance,
            ServiceKind::FireStation => &self.fire_station,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, FeedError> {
    Url::parse(raw).map_err(|e| FeedError::InvalidEndpoint {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Result of a diagnostic fetch against one feed.
#[derive(Debug, Clone)]
pub struct FeedProbe {
    pub kind: ServiceKind,
    pub url: String,
    pub status: u16,
    pub feature_count: usize,
    pub elapsed: Duration,
    /// `Name_TC` / `District_TC` of the first few features.
    pub samples: Vec<(String, String)>,
}

/// HTTP client for the two WFS GeoJSON feeds.
///
/// Every failure comes back as a typed [`FeedError`]; nothing is retried.
/// A failed fetch is surfaced to the caller, who may try again on the next
/// refresh or cache expiry.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    endpoints: FeedEndpoints,
}

impl FeedClient {
    /// Creates a `FeedClient` with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        endpoints: FeedEndpoints,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, endpoints })
    }

    /// Builds a client from the feed settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidEndpoint`] for an unparseable feed URL, or
    /// [`FeedError::Network`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, FeedError> {
        let endpoints =
            FeedEndpoints::parse(&config.ambulance_feed_url, &config.fire_station_feed_url)?;
        Self::new(endpoints, config.feed_timeout_secs, &config.feed_user_agent)
    }

    #[must_use]
    pub fn endpoints(&self) -> &FeedEndpoints {
        &self.endpoints
    }

    /// Fetches and parses the `FeatureCollection` for `kind`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Network`]: timeout, DNS, connection or body-read failure.
    /// - [`FeedError::Upstream`]: any non-2xx status.
    /// - [`FeedError::MalformedResponse`]: body is not JSON or has no
    ///   `features` array.
    pub async fn fetch_collection(&self, kind: ServiceKind) -> Result<FeatureCollection, FeedError> {
        let (collection, status, elapsed) = self.request(kind).await?;
        tracing::info!(
            %kind,
            status,
            features = collection.features.len(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "fetched feed"
        );
        Ok(collection)
    }

    /// Fetches `kind` and reports status, timing, and a few sample names.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_collection`].
    pub async fn probe(&self, kind: ServiceKind) -> Result<FeedProbe, FeedError> {
        let (collection, status, elapsed) = self.request(kind).await?;

        let samples = collection
            .features
            .iter()
            .take(PROBE_SAMPLE_SIZE)
            .map(|value| {
                let feature = Feature::from_value(value).ok();
                let field = |key: &str| {
                    feature
                        .as_ref()
                        .and_then(|f| f.property(key))
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("(unknown)")
                        .to_owned()
                };
                (field(keys::NAME), field(keys::DISTRICT))
            })
            .collect();

        Ok(FeedProbe {
            kind,
            url: self.endpoints.url_for(kind).to_string(),
            status,
            feature_count: collection.features.len(),
            elapsed,
            samples,
        })
    }

    async fn request(
        &self,
        kind: ServiceKind,
    ) -> Result<(FeatureCollection, u16, Duration), FeedError> {
        let url = self.endpoints.url_for(kind);
        let started = Instant::now();

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::warn!(%kind, error = %e, "feed request failed");
            FeedError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%kind, status = status.as_u16(), "feed returned non-success status");
            return Err(FeedError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let collection = serde_json::from_slice::<FeatureCollection>(&body).map_err(|e| {
            tracing::warn!(%kind, error = %e, "feed body is not a FeatureCollection");
            FeedError::MalformedResponse {
                context: format!("{kind} feed at {url}"),
                source: e,
            }
        })?;

        Ok((collection, status.as_u16(), started.elapsed()))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
