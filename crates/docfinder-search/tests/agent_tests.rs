//! End-to-end tests: the A2A router serving the doctor search executor
//! backed by a fixture file.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use docfinder_a2a::{A2aServer, codes};
use docfinder_search::{DoctorSearchExecutor, FixtureDoctorSearch, RequiredFields};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/two_smiths.json")
}

async fn app_with_policy(policy: RequiredFields) -> Router {
    let search = FixtureDoctorSearch::load(fixture_path()).await.unwrap();
    let executor = DoctorSearchExecutor::new(Arc::new(search)).with_policy(policy);
    A2aServer::new(executor).router()
}

async fn app() -> Router {
    app_with_policy(RequiredFields::default()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send(app: &Router, message: Value) -> Value {
    let (status, json) = post(
        app,
        "/a2a",
        json!({"jsonrpc": "2.0", "id": "req-1", "method": "message/send", "params": {"message": message}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

#[tokio::test]
async fn test_named_smith_in_zipcode_finds_two_doctors() {
    let app = app().await;
    let response = send(
        &app,
        json!({"role": "user", "parts": [{"kind": "text", "text": "Find doctors named Smith in 10001"}]}),
    )
    .await;

    let task = &response["result"];
    assert_eq!(task["status"]["state"], "completed");

    let artifact = &task["artifacts"][0];
    assert_eq!(artifact["artifactId"], "doctor-search-results");
    let text = artifact["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 2 doctors matching your search:"));
    assert!(text.contains("1. Dr. Anna Smith\n   Address: 350 5th Ave, New York"));
    assert!(!text.contains("San Francisco"));

    let summary = &artifact["parts"][1]["data"];
    assert_eq!(summary["count"], 2);
    assert_eq!(summary["query"], json!({"zipcode": 10001, "lastname": "Smith"}));

    let reply = &task["status"]["message"];
    assert_eq!(reply["role"], "agent");
    assert_eq!(reply["parts"][0]["text"], text);
}

#[tokio::test]
async fn test_specialty_stops_before_zipcode() {
    let app = app().await;
    let response = send(
        &app,
        json!({"role": "user", "parts": [{"kind": "text", "text": "female doctor with specialty family medicine in 94110"}]}),
    )
    .await;

    let artifact = &response["result"]["artifacts"][0];
    let text = artifact["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 1 doctor matching your search:"));
    assert!(text.contains("Dr. Lee Smith"));
    assert_eq!(
        artifact["parts"][1]["data"]["query"],
        json!({"zipcode": 94110, "specialty": "family medicine", "gender": "female"})
    );
}

#[tokio::test]
async fn test_hello_is_invalid_params() {
    let app = app().await;
    let (status, json) = post(&app, "/a2a", json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], Value::Null);
    assert_eq!(json["error"]["code"], codes::INVALID_PARAMS);
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid search parameters")
    );
}

#[tokio::test]
async fn test_structured_request_with_no_matches() {
    let app = app().await;
    let response = send(
        &app,
        json!({
            "role": "ROLE_USER",
            "parts": [{"type": "data", "data": {"searchDoctors": {"zipcode": "60601"}}}]
        }),
    )
    .await;

    let text = response["result"]["artifacts"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert_eq!(text, "No doctors found matching your search criteria.");
}

#[tokio::test]
async fn test_failed_task_is_readable_afterwards() {
    let app = app().await;
    let response = send(&app, json!({"role": "user", "parts": [{"text": "any doctor"}]})).await;
    let task_id = response["error"]["data"]["taskId"].as_str().unwrap();

    let (_, got) = post(
        &app,
        "/a2a",
        json!({"jsonrpc": "2.0", "id": 2, "method": "tasks/get", "params": {"id": task_id}}),
    )
    .await;
    assert_eq!(got["result"]["status"]["state"], "failed");
    assert_eq!(got["result"]["status"]["error"]["code"], codes::INVALID_PARAMS);
    assert!(got["result"].get("artifacts").is_none());
}

#[tokio::test]
async fn test_specialty_policy_through_rest() {
    let app = app_with_policy(RequiredFields::ZipcodeLastnameOrSpecialty).await;
    let (status, task) = post(
        &app,
        "/a2a/rest/v1/message:send",
        json!({"message": {"role": "user", "parts": [{"kind": "text", "text": "specialty cardiology"}]}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let text = task["artifacts"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 1 doctor matching your search:"));
    assert!(text.contains("Dr. Robert Smith"));
}

#[tokio::test]
async fn test_agent_card_advertises_search_skill() {
    let app = app().await;
    let request = Request::builder()
        .uri("/.well-known/agent-card.json")
        .header(header::HOST, "doctors.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let card: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(card["url"], "http://doctors.example.com/a2a");
    assert_eq!(card["skills"][0]["id"], "search_doctors");
}
