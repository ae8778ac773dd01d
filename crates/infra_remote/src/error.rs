//! Remote store error types
//!
//! Errors raised while configuring or building the HTTP client. Errors of
//! individual store calls are reported as `PortError` through the port.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur while setting up the remote store client
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Configuration could not be read
    #[error("Failed to load store configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration was read but is unusable
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl RemoteError {
    /// Creates an invalid configuration error
    pub fn invalid(message: impl Into<String>) -> Self {
        RemoteError::InvalidConfig(message.into())
    }

    /// Checks if the error comes from configuration rather than the client
    pub fn is_config_error(&self) -> bool {
        matches!(self, RemoteError::Config(_) | RemoteError::InvalidConfig(_))
    }
}

impl From<RemoteError> for PortError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Client(e) => PortError::Connection {
                message: "HTTP client unavailable".to_string(),
                source: Some(Box::new(e)),
            },
            other => PortError::internal(other.to_string()),
        }
    }
}
