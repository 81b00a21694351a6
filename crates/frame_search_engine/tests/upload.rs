use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use frame_search_engine::{
    EngineEvent, FailureKind, ProgressSink, ServiceClient, ServiceSettings, UploadProgress,
    Uploader,
};
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn progress(&self) -> Vec<UploadProgress> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::UploadProgress(progress) => Some(*progress),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn client_for(server: &MockServer) -> ServiceClient {
    ServiceClient::new(ServiceSettings {
        service_url: server.uri(),
        ..ServiceSettings::default()
    })
    .expect("client")
}

fn video_file(contents: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("clip")
        .suffix(".mp4")
        .tempfile()
        .unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn upload_sends_multipart_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("Holiday"))
        .and(body_string_contains("name=\"video\""))
        .and(body_string_contains("video/mp4"))
        .and(body_string_contains("fake video payload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Video uploaded successfully!",
            "video_id": 7,
            "title": "Holiday",
            "detected_objects": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let file = video_file(b"fake video payload");
    let sink = Arc::new(TestSink::default());

    let receipt = client
        .upload(3, file.path(), "Holiday", sink.clone())
        .await
        .expect("upload ok");
    assert_eq!(receipt.title, "Holiday");
    assert_eq!(receipt.video_id, Some(7));
    assert_eq!(
        receipt.message.as_deref(),
        Some("Video uploaded successfully!")
    );

    let progress = sink.progress();
    assert!(!progress.is_empty());
    assert!(progress.iter().all(|p| p.job_id == 3 && p.total == 18));
    assert!(progress.windows(2).all(|w| w[0].loaded <= w[1].loaded));
    assert_eq!(progress.last().unwrap().loaded, 18);
}

#[tokio::test]
async fn upload_requires_created_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "x" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let file = video_file(b"data");
    let err = client
        .upload(1, file.path(), "x", Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(200));
}

#[tokio::test]
async fn upload_bad_request_is_a_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Missing video or title" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let file = video_file(b"data");
    let err = client
        .upload(1, file.path(), "x", Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
}

#[tokio::test]
async fn created_without_title_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "video_id": 1 })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let file = video_file(b"data");
    let err = client
        .upload(1, file.path(), "x", Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn created_with_odd_echo_fields_still_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "title": "Holiday",
            "video_id": "a1b2",
            "message": { "text": "stored" },
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let file = video_file(b"data");
    let receipt = client
        .upload(1, file.path(), "Holiday", Arc::new(TestSink::default()))
        .await
        .expect("created upload is a success");
    assert_eq!(receipt.title, "Holiday");
    assert_eq!(receipt.video_id, None);
    assert_eq!(receipt.message, None);
}

#[tokio::test]
async fn missing_file_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .upload(
            1,
            Path::new("/definitely/not/here.mp4"),
            "x",
            Arc::new(TestSink::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn unreachable_service_is_a_network_failure() {
    let client = ServiceClient::new(ServiceSettings {
        service_url: "http://127.0.0.1:9".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap();
    let file = video_file(b"data");
    let err = client
        .upload(1, file.path(), "x", Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}
