use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORDER_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const CONFIG_FILE: &str = "config/default";

/// Application configuration, loaded from `config/default.toml` overlaid
/// with `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines
    #[serde(default)]
    pub log_json: bool,

    /// Create missing tables at startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// TTL for cached order-list pages
    #[serde(default = "default_order_cache_ttl")]
    pub order_cache_ttl_secs: u64,

    #[validate(range(min = 1, max = 128))]
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_order_cache_ttl() -> u64 {
    DEFAULT_ORDER_CACHE_TTL_SECS
}

fn default_db_max_connections() -> u32 {
    DEFAULT_DB_MAX_CONNECTIONS
}

/// Loads and validates the configuration.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;
    cfg.validate()
        .map_err(|e| ConfigError::Message(e.to_string()))?;
    Ok(cfg)
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "database_url": "sqlite::memory:"
        }))
        .expect("minimal config deserializes");
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
        assert!(cfg.auto_migrate);
        assert!(cfg.validate().is_ok());
    }
}
