//! API configuration

use config::{Config, Environment};
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Path the CRM routes are nested under
    pub api_prefix: String,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_prefix: "/api/v1".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables, defaulting the rest
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(Environment::with_prefix("API"))
    }

    /// Loads configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("api_prefix", defaults.api_prefix)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_fill_missing_settings() {
        let source: HashMap<String, String> =
            [("API_PORT".to_string(), "9090".to_string())].into_iter().collect();

        let config = ApiConfig::from_environment(Environment::with_prefix("API").source(Some(source))).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.server_addr(), "0.0.0.0:9090");
        assert!(!config.log_json);
    }
}
