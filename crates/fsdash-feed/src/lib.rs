pub mod cache;
pub mod client;
pub mod error;
pub mod normalize;
pub mod source;
pub mod types;

pub use cache::{CacheStatus, CachedRecords, Clock, RecordCache, SystemClock};
pub use client::{FeedClient, FeedEndpoints, FeedProbe};
pub use error::{FailureKind, FeedError};
pub use normalize::{normalize_collection, normalize_feature};
pub use source::{FeedSource, RecordSource};
pub use types::{Feature, FeatureCollection};
