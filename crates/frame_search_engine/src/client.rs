use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use client_logging::{client_debug, client_info};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::{
    EngineError, EngineEvent, FailureKind, FrameHit, FrameImage, JobId, UploadProgress,
    UploadReceipt,
};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Base URL of the processing service; endpoints and frame paths resolve against it.
    pub service_url: String,
    pub connect_timeout: Duration,
    /// Applies to search and frame image requests.
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub max_image_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Sends `path` and `title` as one multipart submission.
    async fn upload(
        &self,
        job_id: JobId,
        path: &Path,
        title: &str,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<UploadReceipt, EngineError>;
}

#[async_trait::async_trait]
pub trait FrameSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<FrameHit>, EngineError>;
}

#[async_trait::async_trait]
pub trait FrameImageFetcher: Send + Sync {
    async fn fetch_image(&self, image_url: &str) -> Result<FrameImage, EngineError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    frames: Vec<FrameHit>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// HTTP client for the processing service's upload, search and media endpoints.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    settings: ServiceSettings,
    base: Url,
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(settings: ServiceSettings) -> Result<Self, EngineError> {
        let mut base = Url::parse(&settings.service_url)
            .map_err(|err| EngineError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(EngineError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.service_url),
            ));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| EngineError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        self.base
            .join(path)
            .map_err(|err| EngineError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// `GET /search/?query=<text>` with the query percent-encoded.
    pub fn search_url(&self, query: &str) -> Result<Url, EngineError> {
        let mut url = self.endpoint("search/")?;
        url.query_pairs_mut().append_pair("query", query);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Uploader for ServiceClient {
    async fn upload(
        &self,
        job_id: JobId,
        path: &Path,
        title: &str,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<UploadReceipt, EngineError> {
        let url = self.endpoint("upload/")?;
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|err| io_error(path, err))?;
        let total = file
            .metadata()
            .await
            .map_err(|err| io_error(path, err))?
            .len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        client_info!(
            "Upload job_id={} file={} bytes={} mime={}",
            job_id,
            file_name,
            total,
            mime
        );

        let mut loaded = 0u64;
        let stream = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                loaded += bytes.len() as u64;
                sink.emit(EngineEvent::UploadProgress(UploadProgress {
                    job_id,
                    loaded,
                    total,
                }));
            }
            chunk
        });
        let video = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("video", video)
            .text("title", title.to_string());

        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if status != StatusCode::CREATED {
            return Err(EngineError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let receipt: UploadReceipt = parse_json(&body)?;
        client_info!(
            "Upload job_id={} created title={} video_id={:?} message={:?}",
            job_id,
            receipt.title,
            receipt.video_id,
            receipt.message
        );
        Ok(receipt)
    }
}

#[async_trait::async_trait]
impl FrameSearcher for ServiceClient {
    async fn search(&self, query: &str) -> Result<Vec<FrameHit>, EngineError> {
        let url = self.search_url(query)?;
        client_debug!("Search GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(ErrorResponse { message }) => EngineError::new(
                    FailureKind::ServerMessage {
                        status: status.as_u16(),
                    },
                    message,
                ),
                Err(_) => EngineError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    status.to_string(),
                ),
            });
        }

        let SearchResponse { frames } = parse_json(&body)?;
        if let Some(bad) = frames.iter().find(|hit| !hit.similarity.is_finite()) {
            return Err(EngineError::new(
                FailureKind::MalformedResponse,
                format!("non-finite similarity for frame {}", bad.frame),
            ));
        }
        Ok(frames)
    }
}

#[async_trait::async_trait]
impl FrameImageFetcher for ServiceClient {
    async fn fetch_image(&self, image_url: &str) -> Result<FrameImage, EngineError> {
        let url = Url::parse(image_url)
            .map_err(|err| EngineError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_image_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(EngineError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "frame image too large",
                ));
            }
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(EngineError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "frame image too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FrameImage {
            bytes,
            content_type,
        })
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, EngineError> {
    serde_json::from_slice(body)
        .map_err(|err| EngineError::new(FailureKind::MalformedResponse, err.to_string()))
}

fn io_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::new(FailureKind::Io, format!("{}: {err}", path.display()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        return EngineError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return EngineError::new(FailureKind::InvalidUrl, err.to_string());
    }
    EngineError::new(FailureKind::Network, err.to_string())
}
