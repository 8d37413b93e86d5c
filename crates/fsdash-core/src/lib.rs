pub mod app_config;
pub mod config;
pub mod filter;
pub mod records;
pub mod summary;

use thiserror::Error;

pub use app_config::{
    AppConfig, Environment, DEFAULT_AMBULANCE_FEED_URL, DEFAULT_FIRE_STATION_FEED_URL,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{apply_filter, district_options, map_pins, FilterPredicate, MapPin};
pub use records::{Coordinates, ServiceKind, ServiceRecord, Stringency};
pub use summary::{summarize, DistrictCounts, DistrictSummary, ServiceSummary, SummaryTotals};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown service kind: {0}")]
    UnknownKind(String),
    #[error("unknown normalize stringency \"{0}\" (expected lenient, standard or strict)")]
    UnknownStringency(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
