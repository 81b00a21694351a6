use crate::{FrameDownload, SearchOutcome, StatusLine};

/// Shown when there is no itemized result to display.
pub const NO_RESULTS_MESSAGE: &str = "No frames found.";

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub service_url: String,
    pub selection: SelectionView,
    pub title: String,
    /// Progress of the live job, 0 when idle or after a terminal event.
    pub upload_progress: u8,
    pub upload_status: Option<StatusLine>,
    pub query: String,
    pub searching: bool,
    pub results: DisplayState,
    pub alert: Option<String>,
    /// Bumped each time an alert or upload status line is raised, so a
    /// notice repeated word for word still counts as new.
    pub notices: u64,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionView {
    #[default]
    Empty,
    Probing {
        file_name: String,
    },
    Ready {
        file_name: String,
        duration_secs: f64,
    },
}

/// What the results region shows. The itemized list, the empty message and
/// the error message are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Items(Vec<FrameItemView>),
    NoResults(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameItemView {
    /// 1-based position in the server's ordering.
    pub rank: usize,
    pub frame: String,
    pub image_url: String,
    pub similarity: f64,
    pub similarity_text: String,
    pub download: Option<FrameDownload>,
}

/// Maps the live search outcome onto the results region.
///
/// Items keep the server's order; no outcome yet renders as "no results".
pub fn render_outcome(outcome: Option<&SearchOutcome>, service_url: &str) -> DisplayState {
    match outcome {
        Some(SearchOutcome::Results(frames)) if !frames.is_empty() => DisplayState::Items(
            frames
                .iter()
                .enumerate()
                .map(|(index, result)| FrameItemView {
                    rank: index + 1,
                    frame: result.frame.clone(),
                    image_url: frame_image_url(service_url, &result.frame),
                    similarity: result.similarity,
                    similarity_text: format!("{:.4}", result.similarity),
                    download: None,
                })
                .collect(),
        ),
        Some(SearchOutcome::Error(message)) => DisplayState::Error(message.clone()),
        Some(SearchOutcome::Results(_)) | None => {
            DisplayState::NoResults(NO_RESULTS_MESSAGE.to_string())
        }
    }
}

/// Image location for a frame reference: the service's base URL followed by
/// the reference exactly as the service returned it.
pub fn frame_image_url(service_url: &str, frame: &str) -> String {
    let base = service_url.trim_end_matches('/');
    let frame = frame.trim_start_matches('/');
    format!("{base}/{frame}")
}
