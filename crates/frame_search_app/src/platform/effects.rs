use std::time::Duration;

use client_logging::{client_info, client_warn};
use frame_search_core::{ClientError, Effect, FrameResult, Msg};
use frame_search_engine::{EngineError, EngineEvent, EngineHandle, FailureKind};

const MALFORMED_SEARCH_RESPONSE: &str = "The search service returned an unexpected response.";

/// Hands effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ProbeDuration { generation, path } => {
                    client_info!("ProbeDuration generation={} path={}", generation, path.display());
                    self.engine.probe(generation, path);
                }
                Effect::StartUpload {
                    job_id,
                    path,
                    title,
                } => {
                    client_info!(
                        "StartUpload job_id={} path={} title_len={}",
                        job_id,
                        path.display(),
                        title.len()
                    );
                    self.engine.upload(job_id, path, title);
                }
                Effect::Search { search_id, query } => {
                    client_info!("Search search_id={} query={:?}", search_id, query);
                    self.engine.search(search_id, query);
                }
                Effect::SaveFrame {
                    search_id,
                    rank,
                    frame,
                    image_url,
                    dir,
                } => {
                    client_info!("SaveFrame search_id={} rank={} url={}", search_id, rank, image_url);
                    self.engine.save_frame(search_id, rank, frame, image_url, dir);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event. Fails once the engine
    /// has stopped, since no outstanding work can complete after that.
    pub fn poll(&self, timeout: Duration) -> Result<Option<Msg>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Probed { generation, result } => Msg::MediaProbed {
            generation,
            result: result.map_err(|err| err.message),
        },
        EngineEvent::UploadProgress(progress) => Msg::UploadProgress {
            job_id: progress.job_id,
            loaded: progress.loaded,
            total: progress.total,
        },
        EngineEvent::UploadCompleted { job_id, result } => Msg::UploadDone {
            job_id,
            result: result
                .map(|receipt| receipt.title)
                .map_err(upload_error),
        },
        EngineEvent::SearchCompleted { search_id, result } => Msg::SearchDone {
            search_id,
            result: result
                .map(|hits| {
                    hits.into_iter()
                        .map(|hit| FrameResult {
                            frame: hit.frame,
                            similarity: hit.similarity,
                        })
                        .collect()
                })
                .map_err(search_error),
        },
        EngineEvent::FrameSaved {
            search_id,
            rank,
            result,
        } => {
            if let Err(err) = &result {
                client_warn!("Saving frame #{} of search {} failed: {}", rank, search_id, err);
            }
            Msg::FrameSaved {
                search_id,
                rank,
                result: result.map_err(|err| err.to_string()),
            }
        }
    }
}

/// Upload failures are shown generically; the split only matters for logs.
fn upload_error(err: EngineError) -> ClientError {
    match err.kind {
        FailureKind::HttpStatus(_)
        | FailureKind::ServerMessage { .. }
        | FailureKind::MalformedResponse => ClientError::ServerError(err.to_string()),
        _ => ClientError::TransportFailure(err.to_string()),
    }
}

/// Search failures carrying a service message surface it verbatim.
fn search_error(err: EngineError) -> ClientError {
    match err.kind {
        FailureKind::ServerMessage { .. } => ClientError::ServerError(err.message),
        FailureKind::HttpStatus(code) => {
            ClientError::ServerError(format!("Search service returned status {code}"))
        }
        FailureKind::MalformedResponse => {
            ClientError::ServerError(MALFORMED_SEARCH_RESPONSE.to_string())
        }
        _ => ClientError::TransportFailure(err.to_string()),
    }
}
