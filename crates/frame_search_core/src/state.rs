use std::collections::BTreeMap;
use std::path::PathBuf;

use client_logging::{client_debug, client_info, client_warn};

use crate::error::{SEARCH_FAILED_MESSAGE, UPLOAD_FAILED_MESSAGE};
use crate::media::{self, ValidatedMedia};
use crate::view_model::{render_outcome, AppViewModel, DisplayState, SelectionView};
use crate::{validate, ClientError, MissingField, Rejected};

pub type JobId = u64;
pub type SearchId = u64;

/// Service used when no other base URL is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// The current media selection. Replaced on every pick.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    Empty,
    /// Waiting for the duration probe of this generation to resolve.
    Probing { generation: u64, path: PathBuf },
    Ready(ValidatedMedia),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded { server_title: String },
    Failed { message: String },
}

/// One upload attempt. Its terminal status is set exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJob {
    pub job_id: JobId,
    pub media: ValidatedMedia,
    pub title: String,
    pub progress: u8,
    pub status: UploadStatus,
}

/// One ranked frame as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub frame: String,
    pub similarity: f64,
}

/// Result of the most recent search. Exactly one variant is live.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Ordered as the server returned them.
    Results(Vec<FrameResult>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub severity: Severity,
}

impl StatusLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

/// Download state of one result item's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameDownload {
    Pending,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
struct LiveOutcome {
    search_id: SearchId,
    outcome: SearchOutcome,
}

/// Session context. Each field has a single writer: the `update` arm for
/// the pipeline that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    service_url: String,
    selection: Selection,
    selection_generation: u64,
    title: String,
    upload: Option<UploadJob>,
    last_job_id: JobId,
    upload_status: Option<StatusLine>,
    query: String,
    last_search_id: SearchId,
    pending_search: Option<SearchId>,
    outcome: Option<LiveOutcome>,
    downloads: BTreeMap<usize, FrameDownload>,
    alert: Option<String>,
    notices: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_service_url(DEFAULT_SERVICE_URL)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose result images resolve against `service_url`.
    pub fn with_service_url(service_url: impl Into<String>) -> Self {
        let service_url = service_url.into().trim_end_matches('/').to_string();
        Self {
            service_url,
            selection: Selection::Empty,
            selection_generation: 0,
            title: String::new(),
            upload: None,
            last_job_id: 0,
            upload_status: None,
            query: String::new(),
            last_search_id: 0,
            pending_search: None,
            outcome: None,
            downloads: BTreeMap::new(),
            alert: None,
            notices: 0,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let selection = match &self.selection {
            Selection::Empty => SelectionView::Empty,
            Selection::Probing { path, .. } => SelectionView::Probing {
                file_name: media::display_name(path),
            },
            Selection::Ready(media) => SelectionView::Ready {
                file_name: media.display_name(),
                duration_secs: media.duration_secs(),
            },
        };
        let mut results = render_outcome(
            self.outcome.as_ref().map(|live| &live.outcome),
            &self.service_url,
        );
        if let DisplayState::Items(items) = &mut results {
            for item in items.iter_mut() {
                item.download = self.downloads.get(&item.rank).cloned();
            }
        }
        AppViewModel {
            service_url: self.service_url.clone(),
            selection,
            title: self.title.clone(),
            upload_progress: self.upload.as_ref().map_or(0, |job| job.progress),
            upload_status: self.upload_status.clone(),
            query: self.query.clone(),
            searching: self.pending_search.is_some(),
            results,
            alert: self.alert.clone(),
            notices: self.notices,
            busy: self.is_busy(),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn upload_job(&self) -> Option<&UploadJob> {
        self.upload.as_ref()
    }

    pub fn search_outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref().map(|live| &live.outcome)
    }

    /// True while a probe, upload, search or frame download is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self.selection, Selection::Probing { .. })
            || self
                .upload
                .as_ref()
                .is_some_and(|job| job.status == UploadStatus::InFlight)
            || self.pending_search.is_some()
            || self
                .downloads
                .values()
                .any(|download| *download == FrameDownload::Pending)
    }

    /// Returns whether the view changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_alert(&mut self) {
        if self.alert.take().is_some() {
            self.mark_dirty();
        }
    }

    fn raise_alert(&mut self, text: String) {
        client_info!("Alert: {}", text);
        self.alert = Some(text);
        self.notices += 1;
        self.mark_dirty();
    }

    fn set_upload_status(&mut self, line: StatusLine) {
        self.upload_status = Some(line);
        self.notices += 1;
        self.mark_dirty();
    }

    pub(crate) fn pick_media(&mut self, path: PathBuf) -> u64 {
        self.selection_generation += 1;
        let generation = self.selection_generation;
        client_debug!("Media picked generation={} path={:?}", generation, path);
        self.selection = Selection::Probing { generation, path };
        self.mark_dirty();
        generation
    }

    pub(crate) fn apply_probe(&mut self, generation: u64, result: Result<f64, String>) {
        let path = match &self.selection {
            Selection::Probing {
                generation: current,
                path,
            } if *current == generation => path.clone(),
            _ => {
                client_debug!("Dropping stale probe result generation={}", generation);
                return;
            }
        };

        let validated = result
            .map_err(|reason| Rejected::Unreadable { reason })
            .and_then(|duration| validate(path, duration));
        match validated {
            Ok(media) => {
                client_info!(
                    "Media accepted file={} duration={:.1}s",
                    media.display_name(),
                    media.duration_secs()
                );
                self.selection = Selection::Ready(media);
            }
            Err(rejected) => {
                client_warn!("Media rejected: {:?}", rejected);
                self.selection = Selection::Empty;
                self.raise_alert(ClientError::from(rejected).to_string());
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn set_title(&mut self, title: String) {
        if self.title != title {
            self.title = title;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_query(&mut self, query: String) {
        if self.query != query {
            self.query = query;
            self.mark_dirty();
        }
    }

    /// Starts a new upload job, superseding the previous one.
    pub(crate) fn begin_upload(&mut self) -> Result<(JobId, ValidatedMedia, String), ClientError> {
        let media = match &self.selection {
            Selection::Ready(media) if !self.title.trim().is_empty() => media.clone(),
            _ => {
                let err = ClientError::MissingInput(MissingField::VideoOrTitle);
                self.set_upload_status(StatusLine::error(err.to_string()));
                return Err(err);
            }
        };

        self.last_job_id += 1;
        let job_id = self.last_job_id;
        let title = self.title.clone();
        self.set_upload_status(StatusLine::info(format!(
            "Uploading {}...",
            media.display_name()
        )));
        self.upload = Some(UploadJob {
            job_id,
            media: media.clone(),
            title: title.clone(),
            progress: 0,
            status: UploadStatus::InFlight,
        });
        self.mark_dirty();
        Ok((job_id, media, title))
    }

    pub(crate) fn apply_upload_progress(&mut self, job_id: JobId, loaded: u64, total: u64) {
        let Some(job) = self.live_upload_mut(job_id) else {
            client_debug!("Dropping progress for inactive job {}", job_id);
            return;
        };
        let Some(percent) = progress_percent(loaded, total) else {
            return;
        };
        if percent > job.progress {
            job.progress = percent;
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_upload_done(&mut self, job_id: JobId, result: Result<String, ClientError>) {
        let Some(job) = self.live_upload_mut(job_id) else {
            client_debug!("Dropping completion for inactive job {}", job_id);
            return;
        };
        job.progress = 0;
        let status_line = match result {
            Ok(server_title) => {
                client_info!("Upload job {} succeeded title={}", job_id, server_title);
                let line = StatusLine::info(format!("Video uploaded successfully: {server_title}"));
                job.status = UploadStatus::Succeeded { server_title };
                line
            }
            Err(err) => {
                client_warn!("Upload job {} failed: {}", job_id, err);
                job.status = UploadStatus::Failed {
                    message: UPLOAD_FAILED_MESSAGE.to_string(),
                };
                StatusLine::error(UPLOAD_FAILED_MESSAGE)
            }
        };
        self.set_upload_status(status_line);
    }

    fn live_upload_mut(&mut self, job_id: JobId) -> Option<&mut UploadJob> {
        self.upload
            .as_mut()
            .filter(|job| job.job_id == job_id && job.status == UploadStatus::InFlight)
    }

    pub(crate) fn begin_search(&mut self) -> Result<(SearchId, String), ClientError> {
        if self.query.trim().is_empty() {
            let err = ClientError::MissingInput(MissingField::Query);
            self.raise_alert(err.to_string());
            return Err(err);
        }
        self.last_search_id += 1;
        let search_id = self.last_search_id;
        self.pending_search = Some(search_id);
        self.mark_dirty();
        Ok((search_id, self.query.clone()))
    }

    pub(crate) fn apply_search_done(
        &mut self,
        search_id: SearchId,
        result: Result<Vec<FrameResult>, ClientError>,
    ) {
        if self.pending_search != Some(search_id) {
            client_debug!("Dropping stale search result {}", search_id);
            return;
        }
        self.pending_search = None;
        let outcome = match result {
            Ok(frames) => {
                client_info!("Search {} returned {} frame(s)", search_id, frames.len());
                SearchOutcome::Results(frames)
            }
            Err(ClientError::ServerError(message)) => {
                client_warn!("Search {} rejected by service: {}", search_id, message);
                SearchOutcome::Error(message)
            }
            Err(err) => {
                client_warn!("Search {} failed: {}", search_id, err);
                SearchOutcome::Error(SEARCH_FAILED_MESSAGE.to_string())
            }
        };
        self.outcome = Some(LiveOutcome { search_id, outcome });
        self.downloads.clear();
        self.mark_dirty();
    }

    /// Marks every current result item as pending download.
    pub(crate) fn begin_frame_downloads(&mut self) -> Option<(SearchId, Vec<(usize, String)>)> {
        let (search_id, frames) = match &self.outcome {
            Some(LiveOutcome {
                search_id,
                outcome: SearchOutcome::Results(frames),
            }) if !frames.is_empty() => (*search_id, frames),
            _ => return None,
        };
        let items: Vec<(usize, String)> = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| (index + 1, frame.frame.clone()))
            .collect();
        for (rank, _) in &items {
            self.downloads.insert(*rank, FrameDownload::Pending);
        }
        self.mark_dirty();
        Some((search_id, items))
    }

    pub(crate) fn apply_frame_saved(
        &mut self,
        search_id: SearchId,
        rank: usize,
        result: Result<PathBuf, String>,
    ) {
        let current = self.outcome.as_ref().map(|live| live.search_id);
        if current != Some(search_id) || !self.downloads.contains_key(&rank) {
            client_debug!("Dropping frame download for stale search {}", search_id);
            return;
        }
        let download = match result {
            Ok(path) => FrameDownload::Saved(path),
            Err(reason) => {
                client_warn!("Frame #{} download failed: {}", rank, reason);
                FrameDownload::Failed(reason)
            }
        };
        self.downloads.insert(rank, download);
        self.mark_dirty();
    }

    pub(crate) fn alert_nothing_to_save(&mut self) {
        self.raise_alert("There are no search results to save.".to_string());
    }
}

/// `round(loaded / total * 100)`, clamped to 100. `None` when the total is unknown.
pub fn progress_percent(loaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = ((loaded as f64 * 100.0) / total as f64).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up_and_clamps() {
        assert_eq!(progress_percent(1, 8), Some(13));
        assert_eq!(progress_percent(5, 4), Some(100));
        assert_eq!(progress_percent(0, 10), Some(0));
        assert_eq!(progress_percent(10, 0), None);
    }

    #[test]
    fn service_url_trailing_slash_is_trimmed() {
        let state = AppState::with_service_url("http://media.local:9000/");
        assert_eq!(state.view().service_url, "http://media.local:9000");
    }
}
