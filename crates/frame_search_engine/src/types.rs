use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub type JobId = u64;
pub type SearchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub job_id: JobId,
    /// Bytes of the media part handed to the transport so far.
    pub loaded: u64,
    pub total: u64,
}

/// Body of a `201 Created` upload response. Only `title` is required; the
/// echo fields fall back to `None` when absent or of an unexpected type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub video_id: Option<i64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// One ranked frame from the search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameHit {
    pub frame: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Probed {
        generation: u64,
        result: Result<f64, EngineError>,
    },
    UploadProgress(UploadProgress),
    UploadCompleted {
        job_id: JobId,
        result: Result<UploadReceipt, EngineError>,
    },
    SearchCompleted {
        search_id: SearchId,
        result: Result<Vec<FrameHit>, EngineError>,
    },
    FrameSaved {
        search_id: SearchId,
        rank: usize,
        result: Result<PathBuf, EngineError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    pub kind: FailureKind,
    pub message: String,
}

impl EngineError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "superseded by a newer request")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Non-success status without a usable message body.
    HttpStatus(u16),
    /// Non-success status whose body carried a `message`.
    ServerMessage { status: u16 },
    MalformedResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Timeout,
    Network,
    Io,
    Probe,
    Cancelled,
    /// The engine thread is gone; no further events will arrive.
    Disconnected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::ServerMessage { status } => write!(f, "server error (status {status})"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Probe => write!(f, "metadata probe failed"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Disconnected => write!(f, "engine stopped"),
        }
    }
}
