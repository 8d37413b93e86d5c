use std::future::Future;

use fsdash_core::{ServiceKind, ServiceRecord, Stringency};

use crate::client::FeedClient;
use crate::error::FeedError;
use crate::normalize::normalize_collection;

/// Something that can produce a fresh, normalized record set for a kind.
///
/// [`crate::RecordCache`] is generic over this so tests can count calls and
/// script failures without a network.
pub trait RecordSource: Send + Sync {
    fn fetch_records(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<Vec<ServiceRecord>, FeedError>> + Send;
}

/// Production source: fetch over HTTP, then normalize at a fixed stringency.
#[derive(Debug, Clone)]
pub struct FeedSource {
    client: FeedClient,
    stringency: Stringency,
}

impl FeedSource {
    #[must_use]
    pub fn new(client: FeedClient, stringency: Stringency) -> Self {
        Self { client, stringency }
    }

    #[must_use]
    pub fn client(&self) -> &FeedClient {
        &self.client
    }
}

impl RecordSource for FeedSource {
    async fn fetch_records(&self, kind: ServiceKind) -> Result<Vec<ServiceRecord>, FeedError> {
        let collection = self.client.fetch_collection(kind).await?;
        Ok(normalize_collection(collection, kind, self.stringency))
    }
}
