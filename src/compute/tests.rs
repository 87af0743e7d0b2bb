//! Unit tests for the compute facade.

use super::*;
use crate::gce::ComputeError;
use crate::test_support::{ComputeCall, SCRIPTED_TARGET_ID, ScriptedComputeApi, running_instance};
use rstest::{fixture, rstest};

#[fixture]
fn defaults() -> ComputeDefaults {
    ComputeDefaults::new("demo-project", "us-east1-b")
        .image_project("debian-cloud")
        .image_family("debian-12")
        .instance_type("e2-small")
        .instance_name("web-1")
}

#[fixture]
fn api() -> ScriptedComputeApi {
    ScriptedComputeApi::new()
}

#[rstest]
#[tokio::test]
async fn create_uses_defaults_and_reports_resolved_values(
    api: ScriptedComputeApi,
    defaults: ComputeDefaults,
) {
    let facade = ComputeFacade::new(api.clone(), defaults);

    let created = facade
        .create_instance(InstanceOverrides::default())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(
        created,
        CreatedInstance {
            target_id: SCRIPTED_TARGET_ID.to_owned(),
            image_project: String::from("debian-cloud"),
            image_family: String::from("debian-12"),
            instance_type: String::from("e2-small"),
            instance_name: String::from("web-1"),
        }
    );

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        ComputeCall::LatestImage {
            image_project: String::from("debian-cloud"),
            image_family: String::from("debian-12"),
        }
    );
    let ComputeCall::Insert { config, .. } = &calls[1] else {
        panic!("expected insert call, got {:?}", calls[1]);
    };
    assert_eq!(config.name, "web-1");
    assert_eq!(config.machine_type, "zones/us-east1-b/machineTypes/e2-small");
    assert_eq!(
        config.disks[0].initialize_params.source_image,
        "projects/debian-cloud/global/images/debian-12-v1"
    );
}

#[rstest]
#[tokio::test]
async fn create_does_not_rewrite_defaults(api: ScriptedComputeApi, defaults: ComputeDefaults) {
    let facade = ComputeFacade::new(api, defaults.clone());

    facade
        .create_instance(InstanceOverrides {
            instance_name: Some(String::from("web-2")),
            ..InstanceOverrides::default()
        })
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(facade.defaults(), &defaults);
}

#[rstest]
#[case::image_project(ComputeDefaults::new("p", "z"), "image_project")]
#[case::image_family(ComputeDefaults::new("p", "z").image_project("debian-cloud"), "image_family")]
#[case::instance_type(
    ComputeDefaults::new("p", "z").image_project("debian-cloud").image_family("debian-12"),
    "instance_type"
)]
#[case::instance_name(
    ComputeDefaults::new("p", "z")
        .image_project("debian-cloud")
        .image_family("debian-12")
        .instance_type("e2-small"),
    "instance_name"
)]
#[tokio::test]
async fn create_reports_first_missing_field_without_calls(
    api: ScriptedComputeApi,
    #[case] defaults: ComputeDefaults,
    #[case] field: &str,
) {
    let facade = ComputeFacade::new(api.clone(), defaults);

    let err = facade
        .create_instance(InstanceOverrides::default())
        .await
        .expect_err("create should fail");

    assert_eq!(err, ComputeError::MissingParameter(MissingParameterError::new(field)));
    assert!(api.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn explicit_name_wins_over_default(api: ScriptedComputeApi, defaults: ComputeDefaults) {
    let facade = ComputeFacade::new(api.clone(), defaults);

    facade
        .stop_instance(Some("batch-7"))
        .await
        .unwrap_or_else(|err| panic!("stop should succeed: {err}"));

    assert_eq!(
        api.calls(),
        vec![ComputeCall::Action {
            project: String::from("demo-project"),
            zone: String::from("us-east1-b"),
            name: String::from("batch-7"),
            action: InstanceAction::Stop,
        }]
    );
}

#[rstest]
#[tokio::test]
async fn blank_project_is_reported_before_any_call(api: ScriptedComputeApi) {
    let facade = ComputeFacade::new(api.clone(), ComputeDefaults::new("  ", "us-east1-b"));

    let err = facade.list_instances().await.expect_err("list should fail");

    assert_eq!(err, ComputeError::MissingParameter(MissingParameterError::new("project")));
    assert!(api.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn get_returns_named_instance(defaults: ComputeDefaults) {
    let api = ScriptedComputeApi::new().with_instances(vec![
        running_instance("1", "web-1"),
        running_instance("2", "web-2"),
    ]);
    let facade = ComputeFacade::new(api, defaults);

    let instance = facade
        .get_instance(Some("web-2"))
        .await
        .unwrap_or_else(|err| panic!("get should succeed: {err}"));

    assert_eq!(instance.id, "2");
}

#[rstest]
#[tokio::test]
async fn provider_errors_propagate_unchanged(api: ScriptedComputeApi, defaults: ComputeDefaults) {
    let failure = ComputeError::Api {
        status: 403,
        message: String::from("permission denied"),
    };
    api.fail_next(failure.clone());
    let facade = ComputeFacade::new(api, defaults);

    let err = facade.reset_instance(None).await.expect_err("reset should fail");

    assert_eq!(err, failure);
}
