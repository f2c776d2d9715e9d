//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a malformed value stops the process
//! instead of surfacing at request time.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://roster.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration error for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// sqlx SQLite URL (default: `sqlite://roster.db?mode=rwc`)
    pub database_url: String,
    /// Listen address (default: `0.0.0.0:3000`)
    pub bind_addr: SocketAddr,
    /// Pool size; in-memory databases always use one connection
    pub max_connections: u32,
    /// Insert the sample teams and members on startup
    pub seed_sample_data: bool,
}

impl AppConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            tracing::warn!("DATABASE_URL not set, using default");
            DEFAULT_DATABASE_URL.to_string()
        });

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "DATABASE_MAX_CONNECTIONS",
                        format!("expected a positive integer, got {:?}", value),
                    )
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::invalid(
                    "SEED_SAMPLE_DATA",
                    format!("expected true or false, got {:?}", value),
                )
            })?,
            None => false,
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            seed_sample_data,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn reads_all_values() {
        let config = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_MAX_CONNECTIONS", "8"),
            ("SEED_SAMPLE_DATA", "TRUE"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 8);
        assert!(config.seed_sample_data);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = config(&[("BIND_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "BIND_ADDR", .. }));
    }

    #[test]
    fn rejects_zero_connections() {
        let err = config(&[("DATABASE_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }

    #[test]
    fn rejects_unknown_bool() {
        assert!(config(&[("SEED_SAMPLE_DATA", "maybe")]).is_err());
    }
}
