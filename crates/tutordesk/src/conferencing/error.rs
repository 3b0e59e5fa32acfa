//! Error types for the conferencing gateway.

use thiserror::Error;

/// Errors that can occur talking to the conferencing provider.
#[derive(Debug, Error, Clone)]
pub enum ConferencingError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Provider rejected our account credentials
    #[error("Credentials rejected by provider: {message}")]
    Auth { message: String },

    /// The requested resource does not exist (or is not processed yet)
    #[error("Not found at provider: {message}")]
    NotFound { message: String },

    /// Provider returned a response we did not expect
    #[error("Unexpected provider response: {message}")]
    UnexpectedResponse { message: String },

    /// Configuration is missing or malformed
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ConferencingError {
    /// Returns true if this error is potentially transient and retryable.
    ///
    /// Credential rejections and missing resources are deterministic;
    /// retrying them only burns the provider's rate limit.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConferencingError::Network { .. } | ConferencingError::UnexpectedResponse { .. }
        )
    }
}

impl From<reqwest::Error> for ConferencingError {
    fn from(err: reqwest::Error) -> Self {
        ConferencingError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ConferencingError {
    fn from(err: url::ParseError) -> Self {
        ConferencingError::Config {
            message: err.to_string(),
        }
    }
}
