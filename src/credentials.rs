//! Opaque credentials and ambient access-token discovery.
//!
//! Callers either hand over an OAuth2 access token they already hold or ask
//! for ambient discovery, which mirrors what the Google client libraries do
//! on a workstation or a Compute Engine VM: the `GOOGLE_OAUTH_ACCESS_TOKEN`
//! environment variable first, then the instance metadata server. Tokens are
//! resolved once; refreshing them is left to the caller.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Environment variable consulted first during ambient discovery.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Metadata server endpoint that issues tokens for the default service
/// account of the current Compute Engine instance.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// An OAuth2 bearer token. The value is redacted from `Debug` output.
#[derive(Clone, Eq, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token, trimming surrounding whitespace.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_owned())
    }

    /// Returns the raw token value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Formats the value of an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Credential handed to a client at construction time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Credentials {
    /// A token obtained by the caller.
    Token(AccessToken),
    /// Discover a token from the environment or the metadata server.
    #[default]
    Ambient,
}

/// Errors raised while resolving credentials.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CredentialsError {
    /// Raised when a caller-supplied token is blank.
    #[error("access token must not be empty")]
    EmptyToken,
    /// Raised when no ambient source yields a token.
    #[error("no ambient credentials: set {ACCESS_TOKEN_ENV} or run on Compute Engine ({message})")]
    Unavailable {
        /// Why the metadata server lookup failed.
        message: String,
    },
    /// Raised when the metadata server returns an unusable payload.
    #[error("failed to decode metadata token response: {message}")]
    Decode {
        /// Parser error message.
        message: String,
    },
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl Credentials {
    /// Wraps a caller-supplied token.
    #[must_use]
    pub fn token(value: impl Into<String>) -> Self {
        Self::Token(AccessToken::new(value))
    }

    /// Resolves the credential to a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the supplied token is blank or no
    /// ambient source produces one.
    pub async fn resolve(&self, http: &reqwest::Client) -> Result<AccessToken, CredentialsError> {
        self.resolve_with_metadata_url(http, METADATA_TOKEN_URL).await
    }

    /// Resolves the credential, querying `metadata_url` when ambient
    /// discovery reaches the metadata server.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the supplied token is blank or no
    /// ambient source produces one.
    pub async fn resolve_with_metadata_url(
        &self,
        http: &reqwest::Client,
        metadata_url: &str,
    ) -> Result<AccessToken, CredentialsError> {
        match self {
            Self::Token(token) if token.as_str().is_empty() => Err(CredentialsError::EmptyToken),
            Self::Token(token) => Ok(token.clone()),
            Self::Ambient => {
                if let Some(token) = std::env::var(ACCESS_TOKEN_ENV)
                    .ok()
                    .map(AccessToken::new)
                    .filter(|token| !token.as_str().is_empty())
                {
                    debug!(source = ACCESS_TOKEN_ENV, "resolved ambient access token");
                    return Ok(token);
                }
                fetch_metadata_token(http, metadata_url).await
            }
        }
    }
}

async fn fetch_metadata_token(
    http: &reqwest::Client,
    metadata_url: &str,
) -> Result<AccessToken, CredentialsError> {
    let unavailable = |err: reqwest::Error| CredentialsError::Unavailable {
        message: err.to_string(),
    };

    let response = http
        .get(metadata_url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(unavailable)?;

    let status = response.status();
    if !status.is_success() {
        return Err(CredentialsError::Unavailable {
            message: format!("metadata server returned {status}"),
        });
    }

    let body = response.bytes().await.map_err(unavailable)?;
    let parsed: MetadataToken =
        serde_json::from_slice(&body).map_err(|err| CredentialsError::Decode {
            message: err.to_string(),
        })?;
    debug!(source = "metadata", "resolved ambient access token");
    Ok(AccessToken::new(parsed.access_token))
}
