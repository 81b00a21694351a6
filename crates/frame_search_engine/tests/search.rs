use std::time::Duration;

use frame_search_engine::{FailureKind, FrameHit, FrameSearcher, ServiceClient, ServiceSettings};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ServiceClient {
    ServiceClient::new(ServiceSettings {
        service_url: server.uri(),
        ..ServiceSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn search_returns_frames_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("query", "red car"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "frames": [
                { "frame": "media/frames/clip/frame_30.jpg", "similarity": 0.31 },
                { "frame": "media/frames/clip/frame_0.jpg", "similarity": 0.29 },
                { "frame": "media/frames/clip/frame_60.jpg", "similarity": 0.3 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let frames = client_for(&server).search("red car").await.expect("search ok");
    assert_eq!(
        frames,
        vec![
            FrameHit {
                frame: "media/frames/clip/frame_30.jpg".to_string(),
                similarity: 0.31,
            },
            FrameHit {
                frame: "media/frames/clip/frame_0.jpg".to_string(),
                similarity: 0.29,
            },
            FrameHit {
                frame: "media/frames/clip/frame_60.jpg".to_string(),
                similarity: 0.3,
            },
        ]
    );
}

#[tokio::test]
async fn reserved_characters_survive_the_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("query", "cats & dogs?#1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "frames": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let frames = client_for(&server)
        .search("cats & dogs?#1")
        .await
        .expect("search ok");
    assert!(frames.is_empty());
}

#[test]
fn search_url_is_percent_encoded_under_the_service_prefix() {
    let client = ServiceClient::new(ServiceSettings {
        service_url: "http://svc.local:8000/api".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap();
    let url = client.search_url("a b&c").unwrap();
    assert_eq!(url.as_str(), "http://svc.local:8000/api/search/?query=a+b%26c");
}

#[test]
fn invalid_service_url_is_rejected() {
    let err = ServiceClient::new(ServiceSettings {
        service_url: "not a url".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn failure_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "No matching frames found" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).search("dog").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::ServerMessage { status: 404 });
    assert_eq!(err.message, "No matching frames found");
}

#[tokio::test]
async fn failure_status_without_message_is_plain_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Server Error</h1>"))
        .mount(&server)
        .await;

    let err = client_for(&server).search("dog").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn schema_mismatch_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "frames": [ { "frame": "a.jpg", "similarity": "high" } ]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).search("dog").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn missing_frames_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "frame": "a.jpg" })))
        .mount(&server)
        .await;

    let err = client_for(&server).search("dog").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn slow_search_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "frames": [] })),
        )
        .mount(&server)
        .await;

    let client = ServiceClient::new(ServiceSettings {
        service_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    })
    .unwrap();
    let err = client.search("dog").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
