//! HTTP search backend against a mock server

use docfinder_search::{DoctorSearch, Gender, HttpDoctorSearch, SearchError, SearchQuery};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer, timeout: Duration) -> HttpDoctorSearch {
    let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();
    HttpDoctorSearch::new(endpoint, timeout).unwrap()
}

fn query() -> SearchQuery {
    SearchQuery {
        zipcode: Some(10001),
        lastname: Some("Smith".into()),
        specialty: None,
        gender: Some(Gender::Female),
    }
}

#[tokio::test]
async fn test_posts_query_and_reads_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"zipcode": 10001, "lastname": "Smith", "gender": "female"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 200,
            "result": [
                {"name": "Dr. Anna Smith", "address": "350 5th Ave", "city": "New York", "classification": "Internal Medicine"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = backend(&server, Duration::from_secs(5))
        .search(&query())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].city, "New York");
}

#[tokio::test]
async fn test_backend_error_status_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 400,
            "result": "zipcode not served"
        })))
        .mount(&server)
        .await;

    let err = backend(&server, Duration::from_secs(5))
        .search(&query())
        .await
        .unwrap_err();

    match err {
        SearchError::Backend { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "zipcode not served");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = backend(&server, Duration::from_secs(5))
        .search(&query())
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Backend { status: 502, .. }));
    assert!(err.to_string().contains("bad gateway"));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = backend(&server, Duration::from_secs(5))
        .search(&query())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"statusCode": 200, "result": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = backend(&server, Duration::from_millis(200))
        .search(&query())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
}
