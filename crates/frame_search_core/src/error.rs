use std::fmt;

use thiserror::Error;

/// Status line shown after an upload attempt fails for any reason.
pub const UPLOAD_FAILED_MESSAGE: &str = "Video upload failed. Please try again.";
/// Message shown when a search could not reach the service.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";

/// Which user input was missing when an action was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// Upload needs both a validated video and a non-blank title.
    VideoOrTitle,
    /// Search needs a non-blank query.
    Query,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::VideoOrTitle => write!(f, "Please provide both a video and title."),
            MissingField::Query => write!(f, "Please enter a search query."),
        }
    }
}

/// Reason a media selection was refused before any network interaction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejected {
    #[error("The video is longer than 3 minutes and cannot be uploaded.")]
    TooLong { duration_secs: f64, limit_secs: f64 },
    #[error("The video metadata could not be read: {reason}")]
    Unreadable { reason: String },
}

/// Client-side error taxonomy. Every variant is terminal for the operation
/// that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{0}")]
    MissingInput(MissingField),
    #[error(transparent)]
    ValidationRejected(#[from] Rejected),
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("{0}")]
    ServerError(String),
}
