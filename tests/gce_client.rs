//! Tests for the Compute Engine REST client against a mock server.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use gcp_utils::{
    AccessToken, ComputeApi, ComputeDefaults, ComputeError, ComputeFacade, GceClient,
    InstanceAction, InstanceOverrides,
};
use rstest::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_constants::{IMAGE_FAMILY, IMAGE_PROJECT, INSTANCE_NAME, INSTANCE_TYPE, PROJECT, TOKEN, ZONE};

const INSTANCES_PATH: &str = "/projects/demo-project/zones/us-east1-b/instances";

fn client(server: &MockServer) -> GceClient {
    GceClient::new(server.uri(), AccessToken::new(TOKEN), Duration::from_secs(5))
        .unwrap_or_else(|err| panic!("client should build: {err}"))
}

fn instance_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "RUNNING",
        "machineType": format!("https://www.googleapis.com/compute/v1/projects/{PROJECT}/zones/{ZONE}/machineTypes/{INSTANCE_TYPE}"),
    })
}

fn operation_json(target_id: &str) -> serde_json::Value {
    json!({ "name": "operation-1", "targetId": target_id, "status": "RUNNING" })
}

#[tokio::test]
async fn list_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INSTANCES_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "items": [instance_json("2", "b")] })),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INSTANCES_PATH))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance_json("1", "a")],
            "nextPageToken": "page-2",
        })))
        .mount(&server)
        .await;

    let instances = client(&server)
        .list_instances(PROJECT, ZONE)
        .await
        .unwrap_or_else(|err| panic!("list should succeed: {err}"));

    let names: Vec<_> = instances.iter().map(|instance| instance.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn zone_without_items_lists_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INSTANCES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "compute#instanceList" })))
        .mount(&server)
        .await;

    let facade = ComputeFacade::new(client(&server), ComputeDefaults::new(PROJECT, ZONE));
    let listing = facade
        .list_instances()
        .await
        .unwrap_or_else(|err| panic!("list should succeed: {err}"));

    assert!(listing.is_empty());
}

#[tokio::test]
async fn create_resolves_image_and_posts_machine_config() {
    let server = MockServer::start().await;
    let image_link = format!(
        "https://www.googleapis.com/compute/v1/projects/{IMAGE_PROJECT}/global/images/debian-12-bookworm-v20240515"
    );
    Mock::given(method("GET"))
        .and(path(format!(
            "/projects/{IMAGE_PROJECT}/global/images/family/{IMAGE_FAMILY}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "selfLink": image_link })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INSTANCES_PATH))
        .and(body_partial_json(json!({
            "name": INSTANCE_NAME,
            "machineType": format!("zones/{ZONE}/machineTypes/{INSTANCE_TYPE}"),
            "disks": [{
                "boot": true,
                "autoDelete": true,
                "initializeParams": { "sourceImage": image_link },
            }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_json("5551234")))
        .expect(1)
        .mount(&server)
        .await;

    let defaults = ComputeDefaults::new(PROJECT, ZONE)
        .image_project(IMAGE_PROJECT)
        .image_family(IMAGE_FAMILY)
        .instance_type(INSTANCE_TYPE)
        .instance_name(INSTANCE_NAME);
    let created = ComputeFacade::new(client(&server), defaults)
        .create_instance(InstanceOverrides::default())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(created.target_id, "5551234");
    assert_eq!(created.instance_name, INSTANCE_NAME);
}

#[rstest]
#[case(InstanceAction::Start, "start")]
#[case(InstanceAction::Stop, "stop")]
#[case(InstanceAction::Reset, "reset")]
#[tokio::test]
async fn actions_post_to_verb_paths(#[case] action: InstanceAction, #[case] verb: &str) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{INSTANCES_PATH}/{INSTANCE_NAME}/{verb}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_json("1")))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .perform_action(PROJECT, ZONE, INSTANCE_NAME, action)
        .await
        .unwrap_or_else(|err| panic!("{verb} should succeed: {err}"));
}

#[tokio::test]
async fn delete_uses_http_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{INSTANCES_PATH}/{INSTANCE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_json("1")))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_instance(PROJECT, ZONE, INSTANCE_NAME)
        .await
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
}

#[tokio::test]
async fn provider_errors_surface_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{INSTANCES_PATH}/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_string("resource not found"))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_instance(PROJECT, ZONE, "missing")
        .await
        .expect_err("get should fail");

    assert_eq!(
        err,
        ComputeError::Api {
            status: 404,
            message: String::from("resource not found"),
        }
    );
}

#[tokio::test]
async fn insert_without_target_id_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "selfLink": "img" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "operation-1" })))
        .mount(&server)
        .await;

    let defaults = ComputeDefaults::new(PROJECT, ZONE)
        .image_project(IMAGE_PROJECT)
        .image_family(IMAGE_FAMILY)
        .instance_type(INSTANCE_TYPE);
    let err = ComputeFacade::new(client(&server), defaults)
        .create_instance(InstanceOverrides {
            instance_name: Some(String::from(INSTANCE_NAME)),
            ..InstanceOverrides::default()
        })
        .await
        .expect_err("create should fail");

    assert!(matches!(err, ComputeError::Decode { .. }), "unexpected error: {err:?}");
}
