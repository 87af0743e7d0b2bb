//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::compute::ComputeDefaults;
use crate::credentials::Credentials;
use crate::gce::DEFAULT_COMPUTE_ENDPOINT;
use crate::gcs::DEFAULT_STORAGE_ENDPOINT;

/// Google Cloud settings derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "GCP",
    discovery(
        app_name = "gcp-utils",
        env_var = "GCP_CONFIG_PATH",
        config_file_name = "gcp-utils.toml",
        dotfile_name = ".gcp-utils.toml",
        project_file_name = "gcp-utils.toml"
    )
)]
pub struct GcpConfig {
    /// Project that owns instances and is billed for requests.
    pub project: String,
    /// Zone used for instance calls (for example `us-east1-b`).
    pub zone: String,
    /// Default image family for new instances (for example `debian-12`).
    pub image_family: Option<String>,
    /// Project hosting the image family (for example `debian-cloud`).
    pub image_project: Option<String>,
    /// Default machine type for new instances (for example `e2-small`).
    pub instance_type: Option<String>,
    /// Default instance name for lifecycle calls.
    pub instance_name: Option<String>,
    /// Bucket used by the storage facade.
    pub bucket: Option<String>,
    /// OAuth2 access token. When absent the token is discovered from the
    /// environment or the metadata server.
    pub access_token: Option<String>,
    /// Base URL of the Compute Engine API.
    #[ortho_config(default = DEFAULT_COMPUTE_ENDPOINT.to_owned())]
    pub compute_endpoint: String,
    /// Base URL of the Cloud Storage API.
    #[ortho_config(default = DEFAULT_STORAGE_ENDPOINT.to_owned())]
    pub storage_endpoint: String,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to gcp-utils.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const PROJECT: FieldMetadata = FieldMetadata::new("Google Cloud project", "GCP_PROJECT", "project");
const ZONE: FieldMetadata = FieldMetadata::new("Compute Engine zone", "GCP_ZONE", "zone");
const BUCKET: FieldMetadata = FieldMetadata::new("Cloud Storage bucket", "GCP_BUCKET", "bucket");

impl GcpConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("gcp-utils")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    fn reject_blank(value: Option<&str>, toml_key: &str) -> Result<(), ConfigError> {
        match value {
            Some(text) if text.trim().is_empty() => Err(ConfigError::Blank(toml_key.to_owned())),
            _ => Ok(()),
        }
    }

    /// Performs semantic validation. Required fields must be non-blank and
    /// optional string fields, when present, must not be blank either.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Blank`] when an optional field is whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.project, &PROJECT)?;
        Self::require_field(&self.zone, &ZONE)?;
        for (value, key) in [
            (self.image_family.as_deref(), "image_family"),
            (self.image_project.as_deref(), "image_project"),
            (self.instance_type.as_deref(), "instance_type"),
            (self.instance_name.as_deref(), "instance_name"),
            (self.bucket.as_deref(), "bucket"),
            (self.access_token.as_deref(), "access_token"),
        ] {
            Self::reject_blank(value, key)?;
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Parse(String::from(
                "request_timeout_secs must be greater than zero",
            )));
        }
        Ok(())
    }

    /// Builds compute defaults from the configured values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn as_compute_defaults(&self) -> Result<ComputeDefaults, ConfigError> {
        self.validate()?;
        Ok(ComputeDefaults {
            project: self.project.trim().to_owned(),
            zone: self.zone.trim().to_owned(),
            image_family: self.image_family.clone(),
            image_project: self.image_project.clone(),
            instance_type: self.instance_type.clone(),
            instance_name: self.instance_name.clone(),
        })
    }

    /// Returns the configured bucket name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when no bucket is configured.
    pub fn require_bucket(&self) -> Result<&str, ConfigError> {
        self.bucket
            .as_deref()
            .map(str::trim)
            .filter(|bucket| !bucket.is_empty())
            .ok_or_else(|| BUCKET.missing())
    }

    /// Returns the credential implied by the configuration.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.access_token
            .as_deref()
            .map_or(Credentials::Ambient, Credentials::token)
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates an optional field was set to whitespace.
    #[error("configuration field {0} must not be blank when set")]
    Blank(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
