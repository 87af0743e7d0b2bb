//! Tests for configuration validation and loading.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use gcp_utils::gce::DEFAULT_COMPUTE_ENDPOINT;
use gcp_utils::gcs::DEFAULT_STORAGE_ENDPOINT;
use gcp_utils::test_support::EnvGuard;
use gcp_utils::{ConfigError, Credentials, GcpConfig, StorageError, StorageFacade};
use rstest::*;

use test_constants::{BUCKET, IMAGE_FAMILY, IMAGE_PROJECT, INSTANCE_TYPE, PROJECT, TOKEN, ZONE};

#[fixture]
fn valid_config() -> GcpConfig {
    GcpConfig {
        project: String::from(PROJECT),
        zone: String::from(ZONE),
        image_family: Some(String::from(IMAGE_FAMILY)),
        image_project: Some(String::from(IMAGE_PROJECT)),
        instance_type: Some(String::from(INSTANCE_TYPE)),
        instance_name: None,
        bucket: Some(String::from(BUCKET)),
        access_token: None,
        compute_endpoint: String::from(DEFAULT_COMPUTE_ENDPOINT),
        storage_endpoint: String::from(DEFAULT_STORAGE_ENDPOINT),
        request_timeout_secs: 30,
    }
}

/// Verifies that validation names both the environment variable and the
/// configuration file key for each required field.
#[rstest]
#[case::project(|cfg: &mut GcpConfig| cfg.project.clear(), "GCP_PROJECT", "project")]
#[case::zone(|cfg: &mut GcpConfig| cfg.zone = String::from("  "), "GCP_ZONE", "zone")]
fn validation_produces_actionable_errors(
    valid_config: GcpConfig,
    #[case] mutate: fn(&mut GcpConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    let mut cfg = valid_config;
    mutate(&mut cfg);

    let error = cfg.validate().expect_err("validation should fail");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error, got {error:?}");
    };
    assert!(
        message.contains(env_var),
        "error should mention env var {env_var}: {message}"
    );
    assert!(
        message.contains("gcp-utils.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains(toml_key),
        "error should mention TOML key {toml_key}: {message}"
    );
}

#[rstest]
fn validation_rejects_blank_optional_field(valid_config: GcpConfig) {
    let cfg = GcpConfig {
        image_family: Some(String::from(" ")),
        ..valid_config
    };

    let err = cfg.validate().expect_err("blank image family should fail");
    assert_eq!(err, ConfigError::Blank(String::from("image_family")));
}

#[rstest]
fn validation_rejects_zero_timeout(valid_config: GcpConfig) {
    let cfg = GcpConfig {
        request_timeout_secs: 0,
        ..valid_config
    };

    let err = cfg.validate().expect_err("zero timeout should fail");
    assert!(
        err.to_string().contains("request_timeout_secs"),
        "unexpected error: {err}"
    );
}

#[rstest]
fn compute_defaults_carry_configured_values(valid_config: GcpConfig) {
    let defaults = valid_config
        .as_compute_defaults()
        .unwrap_or_else(|err| panic!("valid config yields defaults: {err}"));

    assert_eq!(defaults.project, PROJECT);
    assert_eq!(defaults.zone, ZONE);
    assert_eq!(defaults.image_family.as_deref(), Some(IMAGE_FAMILY));
    assert_eq!(defaults.image_project.as_deref(), Some(IMAGE_PROJECT));
    assert_eq!(defaults.instance_type.as_deref(), Some(INSTANCE_TYPE));
    assert_eq!(defaults.instance_name, None);
}

#[rstest]
fn missing_bucket_is_actionable(valid_config: GcpConfig) {
    let cfg = GcpConfig {
        bucket: None,
        ..valid_config
    };

    let err = cfg.require_bucket().expect_err("bucket should be required");
    assert!(err.to_string().contains("GCP_BUCKET"), "unexpected error: {err}");
}

#[rstest]
fn credentials_follow_access_token(valid_config: GcpConfig) {
    assert_eq!(valid_config.credentials(), Credentials::Ambient);

    let cfg = GcpConfig {
        access_token: Some(String::from(TOKEN)),
        ..valid_config
    };
    assert_eq!(cfg.credentials(), Credentials::token(TOKEN));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
}

#[tokio::test]
async fn loads_values_from_environment() {
    let _guard = EnvGuard::apply(&[
        ("GCP_PROJECT", Some(PROJECT)),
        ("GCP_ZONE", Some(ZONE)),
        ("GCP_BUCKET", Some(BUCKET)),
        ("GCP_INSTANCE_TYPE", Some(INSTANCE_TYPE)),
        ("GCP_CONFIG_PATH", None),
    ])
    .await;

    let cfg = GcpConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load from env: {err}"));

    assert_eq!(cfg.project, PROJECT);
    assert_eq!(cfg.zone, ZONE);
    assert_eq!(cfg.bucket.as_deref(), Some(BUCKET));
    assert_eq!(cfg.instance_type.as_deref(), Some(INSTANCE_TYPE));
    assert_eq!(cfg.compute_endpoint, DEFAULT_COMPUTE_ENDPOINT);
    assert_eq!(cfg.storage_endpoint, DEFAULT_STORAGE_ENDPOINT);
    assert_eq!(cfg.request_timeout_secs, 30);
}

#[rstest]
#[tokio::test]
async fn storage_from_config_keeps_actionable_bucket_error(valid_config: GcpConfig) {
    let cfg = GcpConfig {
        bucket: None,
        ..valid_config
    };

    let err = StorageFacade::from_config(&cfg)
        .await
        .expect_err("bucket should be required");

    let StorageError::Config(ConfigError::MissingField(ref message)) = err else {
        panic!("expected configuration error, got {err:?}");
    };
    assert!(message.contains("GCP_BUCKET"), "unexpected message: {message}");
    assert!(message.contains("gcp-utils.toml"), "unexpected message: {message}");
}

#[rstest]
#[tokio::test]
async fn storage_from_config_validates_before_connecting(valid_config: GcpConfig) {
    let cfg = GcpConfig {
        request_timeout_secs: 0,
        ..valid_config
    };

    let err = StorageFacade::from_config(&cfg)
        .await
        .expect_err("zero timeout should be rejected");

    assert!(
        matches!(err, StorageError::Config(ConfigError::Parse(_))),
        "unexpected error: {err:?}"
    );
}
