//! Error types for the Compute Engine client.

use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::parameter::MissingParameterError;

/// Errors raised by the compute facade and its REST client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised before any request when a parameter cannot be resolved.
    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),
    /// Raised when no access token could be obtained.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    /// Raised when the request never produced an HTTP response.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the provider answers with a non-success status.
    #[error("compute API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the provider.
        message: String,
    },
    /// Raised when a success response cannot be parsed.
    #[error("failed to decode compute API response: {message}")]
    Decode {
        /// Parser error message.
        message: String,
    },
}

impl From<reqwest::Error> for ComputeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}
