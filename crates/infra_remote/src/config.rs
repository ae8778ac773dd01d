//! Remote store client configuration
//!
//! The client is configured from `CRM_STORE_*` environment variables:
//!
//! * `CRM_STORE_BASE_URL` - Store API root (e.g. `https://store.example.com/api`)
//! * `CRM_STORE_PROJECT_ID` - Project the CRM tables belong to
//! * `CRM_STORE_PUBLIC_KEY` - Public API key sent as a bearer token
//! * `CRM_STORE_TIMEOUT_SECS` - Request timeout (default: 30)
//! * `CRM_STORE_CONNECT_TIMEOUT_SECS` - Connect timeout (default: 10)

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::RemoteError;

/// Environment prefix for the store client settings
pub const ENV_PREFIX: &str = "CRM_STORE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the hosted record store
///
/// # Example
///
/// ```rust
/// use infra_remote::ClientConfig;
///
/// let config = ClientConfig::new("https://store.example.com/api", "crm-project", "pk_live_123")
///     .timeout_secs(10);
/// assert_eq!(config.timeout().as_secs(), 10);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Store API root, without trailing slash
    pub base_url: String,
    /// Project identifier sent with every request
    pub project_id: String,
    /// Public API key
    pub public_key: String,
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Creates a configuration with default timeouts
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            public_key: public_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Sets the whole-request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the connect timeout
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Loads configuration from `CRM_STORE_*` environment variables
    pub fn from_env() -> Result<Self, RemoteError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, RemoteError> {
        let config: Self = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validated()
    }

    /// Checks that every required setting is present and normalizes the base URL
    pub fn validated(mut self) -> Result<Self, RemoteError> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(RemoteError::invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(RemoteError::invalid("project_id is empty"));
        }
        if self.public_key.trim().is_empty() {
            return Err(RemoteError::invalid("public_key is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(RemoteError::invalid("timeout_secs must be positive"));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://store.test", "proj", "pk")
            .timeout_secs(5)
            .connect_timeout_secs(2);

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_loads_from_prefixed_environment() {
        let config = ClientConfig::from_environment(env(&[
            ("CRM_STORE_BASE_URL", "https://store.test/api/"),
            ("CRM_STORE_PROJECT_ID", "crm-demo"),
            ("CRM_STORE_PUBLIC_KEY", "pk_test"),
            ("CRM_STORE_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://store.test/api");
        assert_eq!(config.project_id, "crm-demo");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let error = ClientConfig::from_environment(env(&[
            ("CRM_STORE_BASE_URL", "https://store.test"),
            ("CRM_STORE_PROJECT_ID", "crm-demo"),
        ]))
        .unwrap_err();

        assert!(matches!(error, RemoteError::Config(_)));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let error = ClientConfig::new("store.test", "proj", "pk").validated().unwrap_err();
        assert!(error.to_string().contains("base_url"));
    }

    #[test]
    fn test_rejects_blank_key() {
        let error = ClientConfig::new("https://store.test", "proj", "  ").validated().unwrap_err();
        assert!(error.is_config_error());
    }
}
