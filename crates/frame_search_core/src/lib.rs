//! Frame search core: pure state machine, media validation and result presentation.
mod effect;
mod error;
mod media;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{
    ClientError, MissingField, Rejected, SEARCH_FAILED_MESSAGE, UPLOAD_FAILED_MESSAGE,
};
pub use media::{validate, ValidatedMedia, MAX_DURATION_SECS};
pub use msg::Msg;
pub use state::{
    progress_percent, AppState, FrameDownload, FrameResult, JobId, SearchId, SearchOutcome,
    Selection, Severity, StatusLine, UploadJob, UploadStatus, DEFAULT_SERVICE_URL,
};
pub use update::update;
pub use view_model::{
    frame_image_url, render_outcome, AppViewModel, DisplayState, FrameItemView, SelectionView,
    NO_RESULTS_MESSAGE,
};
