use crate::app_config::{
    AppConfig, Environment, DEFAULT_AMBULANCE_FEED_URL, DEFAULT_FIRE_STATION_FEED_URL,
};
use crate::records::Stringency;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a working
/// config pointed at the public CSDI feeds.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("FSDASH_ENV", "development"))?;

    let bind_addr = parse_addr("FSDASH_BIND_ADDR", "0.0.0.0:8501")?;
    let log_level = or_default("FSDASH_LOG_LEVEL", "info");

    let ambulance_feed_url = or_default("FSDASH_AMBULANCE_FEED_URL", DEFAULT_AMBULANCE_FEED_URL);
    let fire_station_feed_url =
        or_default("FSDASH_FIRE_STATION_FEED_URL", DEFAULT_FIRE_STATION_FEED_URL);

    let feed_timeout_secs = parse_u64("FSDASH_FEED_TIMEOUT_SECS", "10")?;
    if feed_timeout_secs == 0 {
        return Err(invalid(
            "FSDASH_FEED_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }
    let feed_user_agent = or_default(
        "FSDASH_FEED_USER_AGENT",
        "fsdash/0.1 (fire-services-dashboard)",
    );

    let cache_ttl_secs = parse_u64("FSDASH_CACHE_TTL_SECS", "3600")?;
    let normalize_stringency = or_default("FSDASH_NORMALIZE_STRINGENCY", "standard")
        .parse::<Stringency>()
        .map_err(|e| invalid("FSDASH_NORMALIZE_STRINGENCY", e.to_string()))?;
    let background_refresh = parse_bool("FSDASH_BACKGROUND_REFRESH", "false")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        ambulance_feed_url,
        fire_station_feed_url,
        feed_timeout_secs,
        feed_user_agent,
        cache_ttl_secs,
        normalize_stringency,
        background_refresh,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FSDASH_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
