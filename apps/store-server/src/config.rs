//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

/// Store server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the listener binds to
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_addr: String,

    /// Directory holding the flat-file tables
    pub data_dir: PathBuf,

    /// Directory the audit log is written to
    pub log_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            port: env::var("STORE_PORT")
                .unwrap_or_else(|_| "5050".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STORE_PORT".to_string()))?,

            bind_addr: env::var("STORE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),

            data_dir: env::var("STORE_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),

            log_dir: env::var("STORE_LOG_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
        })
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 5050,
            bind_addr: "0.0.0.0".to_string(),
            data_dir: "data".into(),
            log_dir: "logs".into(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
