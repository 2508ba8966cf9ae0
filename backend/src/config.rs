//! Configuration management for the Atelier Orders backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ATELIER_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Carrier integrations
    pub carriers: CarriersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CarriersConfig {
    /// Request timeout for carrier API calls, in seconds
    pub timeout_seconds: u64,

    pub yalidine: YalidineConfig,

    pub zrexpress: ZrExpressConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YalidineConfig {
    /// API base URL
    pub base_url: String,

    /// X-API-ID header value
    pub api_id: String,

    /// X-API-TOKEN header value
    pub api_token: String,

    /// Origin wilaya the boutique ships from
    pub origin_wilaya: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZrExpressConfig {
    /// API base URL
    pub base_url: String,

    /// Account token header value
    pub token: String,

    /// Account key header value
    pub key: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ATELIER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("carriers.timeout_seconds", 15)?
            .set_default("carriers.yalidine.base_url", "https://api.yalidine.app")?
            .set_default("carriers.yalidine.origin_wilaya", "Alger")?
            .set_default("carriers.zrexpress.base_url", "https://procolis.com/api_v1")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ATELIER_ prefix)
            .add_source(
                Environment::with_prefix("ATELIER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
