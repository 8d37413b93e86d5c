use std::net::SocketAddr;

use crate::records::Stringency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Ambulance depot locations, WFS `GetFeature` as GeoJSON.
pub const DEFAULT_AMBULANCE_FEED_URL: &str = "https://portal.csdi.gov.hk/server/services/common/hkfsd_rcd_1634799003993_7633/MapServer/WFSServer?service=wfs&request=GetFeature&typenames=AmbDepots&outputFormat=geojson";

/// Fire station locations, WFS `GetFeature` as GeoJSON.
pub const DEFAULT_FIRE_STATION_FEED_URL: &str = "https://portal.csdi.gov.hk/server/services/common/hkfsd_rcd_1634798867463_89696/MapServer/WFSServer?service=wfs&request=GetFeature&typenames=FireStations&outputFormat=geojson";

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub ambulance_feed_url: String,
    pub fire_station_feed_url: String,
    pub feed_timeout_secs: u64,
    pub feed_user_agent: String,
    pub cache_ttl_secs: u64,
    pub normalize_stringency: Stringency,
    pub background_refresh: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("ambulance_feed_url", &self.ambulance_feed_url)
            .field("fire_station_feed_url", &self.fire_station_feed_url)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("normalize_stringency", &self.normalize_stringency)
            .field("background_refresh", &self.background_refresh)
            .finish()
    }
}
