//! Frame search engine: media probing, upload and search transport, and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod probe;
mod types;

pub use client::{
    ChannelProgressSink, FrameImageFetcher, FrameSearcher, ProgressSink, ServiceClient,
    ServiceSettings, Uploader,
};
pub use engine::{EngineHandle, EngineServices, EngineSettings};
pub use filename::frame_filename;
pub use persist::{ensure_download_dir, AtomicFileWriter, PersistError};
pub use probe::{parse_ffprobe_duration, DurationProbe, FfprobeDurationProbe, ProbeSettings};
pub use types::{
    EngineError, EngineEvent, FailureKind, FrameHit, FrameImage, JobId, SearchId,
    UploadProgress, UploadReceipt,
};
