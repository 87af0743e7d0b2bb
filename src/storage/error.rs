//! Error types for the storage facade and its clients.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::credentials::CredentialsError;
use crate::parameter::MissingParameterError;

/// Errors raised by storage operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StorageError {
    /// Raised before any request when a parameter is missing.
    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),
    /// Raised when layered configuration is invalid or names no bucket.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Raised when no access token could be obtained.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    /// Raised when the connection fails, is reset, or times out. This is the
    /// only failure that triggers the upload fallback.
    #[error("connection failure: {message}")]
    Connection {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when listing a bucket that does not exist.
    #[error("bucket {bucket} not found")]
    BucketNotFound {
        /// Bucket name.
        bucket: String,
    },
    /// Raised when the provider answers with a non-success status.
    #[error("storage API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the provider.
        message: String,
    },
    /// Raised when a request cannot be constructed.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
    /// Raised when a provider response cannot be parsed.
    #[error("failed to decode storage API response: {message}")]
    Decode {
        /// Parser error message.
        message: String,
    },
    /// Raised when a local file cannot be read or written.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Local path involved.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

impl StorageError {
    /// Returns `true` for connection-level failures.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Builds an [`StorageError::Io`] for `path`.
    #[must_use]
    pub fn io(path: impl Into<Utf8PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(value: reqwest::Error) -> Self {
        let message = value.to_string();
        if value.is_builder() {
            Self::InvalidRequest { message }
        } else if value.is_decode() {
            Self::Decode { message }
        } else if let Some(status) = value.status() {
            Self::Api {
                status: status.as_u16(),
                message,
            }
        } else {
            Self::Connection { message }
        }
    }
}
