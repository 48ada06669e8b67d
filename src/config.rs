use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::persistence::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Database URL. Without it shapes and chat are only kept in memory.
    pub db_url: Option<String>,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Attempts per durable write, including the first
    #[serde(default = "default_persist_max_attempts")]
    pub persist_max_attempts: u32,

    #[serde(default = "default_persist_initial_backoff_ms")]
    pub persist_initial_backoff_ms: u64,

    #[serde(default = "default_persist_max_backoff_ms")]
    pub persist_max_backoff_ms: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        Ok(envy::from_env::<Config>()?)
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Tracing filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> String {
        let level = &self.log_level;
        format!("whiteboard_sync={level},tower_http={level},axum::rejection=trace,{level}")
    }

    /// Retry behavior for durable writes
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.persist_max_attempts)
            .with_initial_backoff(Duration::from_millis(self.persist_initial_backoff_ms))
            .with_max_backoff(Duration::from_millis(self.persist_max_backoff_ms))
    }

    /// Parsed CORS origins, empty when unset
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            db_url: None,
            db_max_connections: default_db_max_connections(),
            persist_max_attempts: default_persist_max_attempts(),
            persist_initial_backoff_ms: default_persist_initial_backoff_ms(),
            persist_max_backoff_ms: default_persist_max_backoff_ms(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_persist_max_attempts() -> u32 {
    5
}

fn default_persist_initial_backoff_ms() -> u64 {
    100
}

fn default_persist_max_backoff_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_development());
        assert!(config.cors_origin_list().is_empty());
        assert_eq!(
            config.default_log_filter(),
            "whiteboard_sync=info,tower_http=info,axum::rejection=trace,info"
        );
        let retry = config.retry_policy();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_backoff, Duration::from_millis(100));
    }

    #[test]
    fn reads_from_env_pairs() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("CORS_ORIGINS".to_string(), "http://a.test, http://b.test".to_string()),
            ("PERSIST_MAX_ATTEMPTS".to_string(), "2".to_string()),
            ("LOG_LEVEL".to_string(), "warn".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.cors_origin_list(), vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.retry_policy().max_attempts, 2);
        assert!(config.db_url.is_none());
        assert!(config.default_log_filter().starts_with("whiteboard_sync=warn,"));
    }
}
