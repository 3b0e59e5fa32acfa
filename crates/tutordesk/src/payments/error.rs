//! Error types for the payment gateway.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PaymentError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Gateway rejected the order request
    #[error("Gateway rejected order: {message}")]
    Rejected { message: String },

    /// Gateway returned a response we did not expect
    #[error("Unexpected gateway response: {message}")]
    UnexpectedResponse { message: String },

    /// Configuration is missing or malformed
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PaymentError {
    fn from(err: url::ParseError) -> Self {
        PaymentError::Config {
            message: err.to_string(),
        }
    }
}
