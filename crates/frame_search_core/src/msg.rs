use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User chose a local media file.
    MediaPicked(PathBuf),
    /// Duration probe resolved for the selection of `generation`.
    MediaProbed {
        generation: u64,
        result: Result<f64, String>,
    },
    /// User edited the title input.
    TitleChanged(String),
    /// User clicked Upload.
    UploadClicked,
    /// Transport progress for an upload job.
    UploadProgress {
        job_id: crate::JobId,
        loaded: u64,
        total: u64,
    },
    /// Terminal event for an upload job; `Ok` carries the server-echoed title.
    UploadDone {
        job_id: crate::JobId,
        result: Result<String, crate::ClientError>,
    },
    /// User edited the query input.
    QueryChanged(String),
    /// User clicked Search.
    SearchClicked,
    /// Search response (or failure) for a previously issued search.
    SearchDone {
        search_id: crate::SearchId,
        result: Result<Vec<crate::FrameResult>, crate::ClientError>,
    },
    /// User asked to store the current result images in `dir`.
    SaveFramesClicked { dir: PathBuf },
    /// One result image finished downloading.
    FrameSaved {
        search_id: crate::SearchId,
        rank: usize,
        result: Result<PathBuf, String>,
    },
    /// Coordinator tick; coalesces rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
