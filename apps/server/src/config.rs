//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for a single-store deployment.

use std::env;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Maximum database connections
    pub max_connections: u32,

    /// Default shipping fee in cents for places without a table entry
    pub default_shipping_fee_cents: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("TINDERA_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TINDERA_PORT".to_string()))?,

            database_path: env::var("TINDERA_DB_PATH")
                .unwrap_or_else(|_| "./tindera.db".to_string()),

            max_connections: env::var("TINDERA_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TINDERA_MAX_CONNECTIONS".to_string()))?,

            default_shipping_fee_cents: env::var("TINDERA_DEFAULT_SHIPPING_FEE_CENTS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("TINDERA_DEFAULT_SHIPPING_FEE_CENTS".to_string())
                })?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_env() {
        let config = ServerConfig::load().unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.max_connections, 5);
    }
}
