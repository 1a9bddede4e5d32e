//! Configuration management for the CropGuard server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CROPGUARD__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{AdvisoryThresholds, BatchPolicy};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Object storage holding uploaded scans
    pub storage: StorageConfig,

    /// External pest detection service
    pub detection: DetectionConfig,

    /// Weather forecast provider
    pub weather: WeatherConfig,

    /// Market price windows
    pub market: MarketConfig,

    /// Scan batch behaviour
    pub scan: ScanConfig,

    /// Advisory rule thresholds
    #[serde(default)]
    pub advisory: AdvisoryThresholds,

    pub logging: LoggingConfig,
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
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base URL of the storage REST API
    pub base_url: String,

    /// Service key sent as bearer token
    pub service_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Pest detection endpoint receiving multipart uploads
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Forecast API endpoint
    pub api_endpoint: String,

    /// Coordinates the forecast is fetched for
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// Days of history shown on trend charts
    pub trend_window_days: i64,

    /// Most recent submissions fed to the advisory engine
    pub advisory_sample_size: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    pub batch_policy: BatchPolicy,

    /// Largest accepted multipart request body in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("CROPGUARD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("storage.base_url", "http://localhost:54321")?
            .set_default("storage.service_key", "")?
            .set_default(
                "detection.endpoint",
                "https://Ore5187-cropguard-ai-backend.hf.space/detect/",
            )?
            .set_default("weather.api_endpoint", "https://api.open-meteo.com")?
            .set_default("weather.latitude", 9.0820)?
            .set_default("weather.longitude", 8.6753)?
            .set_default("market.trend_window_days", 30)?
            .set_default("market.advisory_sample_size", 50)?
            .set_default("scan.batch_policy", "abort_on_first_error")?
            .set_default("scan.max_upload_bytes", 100 * 1024 * 1024)?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CROPGUARD__ prefix)
            .add_source(
                Environment::with_prefix("CROPGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
