use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ProbeDuration {
        generation: u64,
        path: PathBuf,
    },
    StartUpload {
        job_id: crate::JobId,
        path: PathBuf,
        title: String,
    },
    Search {
        search_id: crate::SearchId,
        query: String,
    },
    SaveFrame {
        search_id: crate::SearchId,
        rank: usize,
        frame: String,
        image_url: String,
        dir: PathBuf,
    },
}
