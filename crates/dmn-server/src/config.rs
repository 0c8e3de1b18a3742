//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Log level for the gateway crates, used when `RUST_LOG` is unset
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config/server` and environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from("config/server")
    }

    /// Load configuration from an optional file (extension may be omitted)
    /// layered under `DMN_`-prefixed environment variables
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::with_prefix("DMN"))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default `EnvFilter` directives derived from `log_level`
    pub fn default_log_filter(&self) -> String {
        format!(
            "dmn_server={level},dmn_sdk={level},dmn_engine={level},tower_http=debug",
            level = self.log_level
        )
    }
}
