//! Configuration for the Facesim Server
//!
//! Values come from environment variables; a `.env` file in the working
//! directory is loaded first when present.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Backing store: `postgres://…` or `memory://`
    pub service_uri: String,

    /// Dimension of every stored embedding
    #[serde(default = "default_dimension")]
    pub embedding_dimension: usize,

    /// URL of the external face detector
    pub detector_url: String,

    /// URL of the external embedding extractor
    pub extractor_url: String,

    /// Request timeout for the detector and extractor, in seconds
    #[serde(default = "default_external_timeout")]
    pub external_timeout_secs: u64,

    /// Maximum number of database connections
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_port() -> u16 {
    5000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_external_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from the environment (and `.env`, if present)
    pub fn load() -> ServerResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// `SERVICE_URI`, `DETECTOR_URL` and `EXTRACTOR_URL` are required.
    /// Unparseable optional values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ServerError::ConfigError(format!("{} must be set", key)))
        };

        let mut config = Self {
            port: default_port(),
            bind_address: default_host(),
            service_uri: required("SERVICE_URI")?,
            embedding_dimension: default_dimension(),
            detector_url: required("DETECTOR_URL")?,
            extractor_url: required("EXTRACTOR_URL")?,
            external_timeout_secs: default_external_timeout(),
            db_max_connections: default_max_connections(),
            log_level: default_log_level(),
            log_json: false,
        };

        if let Some(port) = lookup("SERVER_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Invalid SERVER_PORT value: {}", port),
            }
        }

        if let Some(host) = lookup("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Some(dimension) = lookup("EMBEDDING_DIMENSION") {
            match dimension.parse::<usize>() {
                Ok(0) => {
                    return Err(ServerError::ConfigError(
                        "EMBEDDING_DIMENSION must be positive".to_string(),
                    ))
                }
                Ok(dimension) => config.embedding_dimension = dimension,
                Err(_) => warn!("Invalid EMBEDDING_DIMENSION value: {}", dimension),
            }
        }

        if let Some(timeout) = lookup("EXTERNAL_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(timeout) => config.external_timeout_secs = timeout,
                Err(_) => warn!("Invalid EXTERNAL_TIMEOUT_SECS value: {}", timeout),
            }
        }

        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) if max > 0 => config.db_max_connections = max,
                _ => warn!("Invalid DB_MAX_CONNECTIONS value: {}", max),
            }
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Some(log_json) = lookup("LOG_JSON") {
            config.log_json = matches!(log_json.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Address the server binds to
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }
}
