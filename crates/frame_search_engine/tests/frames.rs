use std::fs;

use frame_search_engine::{
    ensure_download_dir, frame_filename, AtomicFileWriter, FailureKind, FrameImageFetcher,
    ServiceClient, ServiceSettings,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn filename_is_deterministic_and_safe() {
    let name = frame_filename(1, "media/frames/my clip/frame_30.jpg", None);
    assert!(name.starts_with("01--frame_30--"), "{name}");
    assert!(name.ends_with(".jpg"));
    assert_eq!(name, frame_filename(1, "media/frames/my clip/frame_30.jpg", None));

    // Same basename in another folder must not collide.
    let other = frame_filename(1, "media/frames/other/frame_30.jpg", None);
    assert_ne!(name, other);

    let odd = frame_filename(12, "weird:name?.PNG", None);
    assert!(odd.starts_with("12--weird_name--"), "{odd}");
    assert!(odd.ends_with(".png"));

    let reserved = frame_filename(3, "frames/CON", Some("image/webp"));
    assert!(reserved.starts_with("03--CON_--"), "{reserved}");
    assert!(reserved.ends_with(".webp"));
}

#[test]
fn creates_missing_download_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("frames");
    assert!(!new_dir.exists());
    ensure_download_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("01.jpg", b"first").unwrap();
    let second = writer.write("01.jpg", b"second").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second");
}

#[test]
fn write_into_a_file_path_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("01.jpg", b"data").is_err());
    assert!(!file_path.with_file_name("01.jpg").exists());
}

#[tokio::test]
async fn fetches_frame_image_from_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/frames/clip/frame_0.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0xFF, 0xD8, 0xFF], "image/jpeg"))
        .mount(&server)
        .await;

    let client = ServiceClient::new(ServiceSettings {
        service_url: server.uri(),
        ..ServiceSettings::default()
    })
    .unwrap();
    let url = format!("{}/media/frames/clip/frame_0.jpg", server.uri());
    let image = client.fetch_image(&url).await.expect("image");
    assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn oversized_frame_image_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 64], "image/jpeg"))
        .mount(&server)
        .await;

    let client = ServiceClient::new(ServiceSettings {
        service_url: server.uri(),
        max_image_bytes: 16,
        ..ServiceSettings::default()
    })
    .unwrap();
    let err = client
        .fetch_image(&format!("{}/big.jpg", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 16,
            actual: Some(64)
        }
    );
}
