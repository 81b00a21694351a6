use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use client_logging::{client_debug, client_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::client::{
    ChannelProgressSink, FrameImageFetcher, FrameSearcher, ProgressSink, ServiceClient,
    ServiceSettings, Uploader,
};
use crate::filename::frame_filename;
use crate::persist::AtomicFileWriter;
use crate::probe::{DurationProbe, FfprobeDurationProbe, ProbeSettings};
use crate::{EngineError, EngineEvent, FailureKind, JobId, SearchId};

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub service: ServiceSettings,
    pub probe: ProbeSettings,
}

/// The IO collaborators the engine drives.
#[derive(Clone)]
pub struct EngineServices {
    pub probe: Arc<dyn DurationProbe>,
    pub uploader: Arc<dyn Uploader>,
    pub searcher: Arc<dyn FrameSearcher>,
    pub images: Arc<dyn FrameImageFetcher>,
}

enum EngineCommand {
    Probe {
        generation: u64,
        path: PathBuf,
    },
    Upload {
        job_id: JobId,
        path: PathBuf,
        title: String,
    },
    Search {
        search_id: SearchId,
        query: String,
    },
    SaveFrame {
        search_id: SearchId,
        rank: usize,
        frame: String,
        image_url: String,
        dir: PathBuf,
    },
}

/// Handle to the background engine thread. Commands are executed as tasks on
/// a tokio runtime; results come back as [`EngineEvent`]s in per-task order.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let client = Arc::new(ServiceClient::new(settings.service)?);
        let services = EngineServices {
            probe: Arc::new(FfprobeDurationProbe::new(settings.probe)),
            uploader: client.clone(),
            searcher: client.clone(),
            images: client,
        };
        Self::with_services(services)
    }

    pub fn with_services(services: EngineServices) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("frame-search-engine".to_string())
            .spawn(move || {
                let mut worker = Worker::new(runtime, services, event_tx);
                while let Ok(command) = cmd_rx.recv() {
                    worker.dispatch(command);
                }
                client_debug!("Engine command channel closed");
            })
            .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn probe(&self, generation: u64, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Probe {
            generation,
            path: path.into(),
        });
    }

    pub fn upload(&self, job_id: JobId, path: impl Into<PathBuf>, title: impl Into<String>) {
        self.send(EngineCommand::Upload {
            job_id,
            path: path.into(),
            title: title.into(),
        });
    }

    pub fn search(&self, search_id: SearchId, query: impl Into<String>) {
        self.send(EngineCommand::Search {
            search_id,
            query: query.into(),
        });
    }

    pub fn save_frame(
        &self,
        search_id: SearchId,
        rank: usize,
        frame: impl Into<String>,
        image_url: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) {
        self.send(EngineCommand::SaveFrame {
            search_id,
            rank,
            frame: frame.into(),
            image_url: image_url.into(),
            dir: dir.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` on timeout; an
    /// error once the engine thread has stopped.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::new(
                FailureKind::Disconnected,
                "engine event channel closed",
            )),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            client_warn!("Engine thread is gone; command dropped");
        }
    }
}

/// Holds the token of the latest task of one kind; starting a new one cancels it.
#[derive(Default)]
struct Supersede {
    current: Option<CancellationToken>,
}

impl Supersede {
    fn begin(&mut self) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }
}

struct Worker {
    runtime: Runtime,
    services: EngineServices,
    event_tx: mpsc::Sender<EngineEvent>,
    probes: Supersede,
    uploads: Supersede,
    searches: Supersede,
}

impl Worker {
    fn new(runtime: Runtime, services: EngineServices, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            runtime,
            services,
            event_tx,
            probes: Supersede::default(),
            uploads: Supersede::default(),
            searches: Supersede::default(),
        }
    }

    fn dispatch(&mut self, command: EngineCommand) {
        let event_tx = self.event_tx.clone();
        match command {
            EngineCommand::Probe { generation, path } => {
                let token = self.probes.begin();
                let probe = self.services.probe.clone();
                self.runtime.spawn(async move {
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(EngineError::cancelled()),
                        result = probe.probe(&path) => result,
                    };
                    let _ = event_tx.send(EngineEvent::Probed { generation, result });
                });
            }
            EngineCommand::Upload {
                job_id,
                path,
                title,
            } => {
                let token = self.uploads.begin();
                let uploader = self.services.uploader.clone();
                self.runtime.spawn(async move {
                    let sink: Arc<dyn ProgressSink> =
                        Arc::new(ChannelProgressSink::new(event_tx.clone()));
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(EngineError::cancelled()),
                        result = uploader.upload(job_id, &path, &title, sink) => result,
                    };
                    let _ = event_tx.send(EngineEvent::UploadCompleted { job_id, result });
                });
            }
            EngineCommand::Search { search_id, query } => {
                let token = self.searches.begin();
                let searcher = self.services.searcher.clone();
                self.runtime.spawn(async move {
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(EngineError::cancelled()),
                        result = searcher.search(&query) => result,
                    };
                    let _ = event_tx.send(EngineEvent::SearchCompleted { search_id, result });
                });
            }
            EngineCommand::SaveFrame {
                search_id,
                rank,
                frame,
                image_url,
                dir,
            } => {
                let images = self.services.images.clone();
                self.runtime.spawn(async move {
                    let result = save_frame(images.as_ref(), rank, &frame, &image_url, dir).await;
                    let _ = event_tx.send(EngineEvent::FrameSaved {
                        search_id,
                        rank,
                        result,
                    });
                });
            }
        }
    }
}

async fn save_frame(
    images: &dyn FrameImageFetcher,
    rank: usize,
    frame: &str,
    image_url: &str,
    dir: PathBuf,
) -> Result<PathBuf, EngineError> {
    let image = images.fetch_image(image_url).await?;
    let filename = frame_filename(rank, frame, image.content_type.as_deref());
    let writer = AtomicFileWriter::new(dir);
    tokio::task::spawn_blocking(move || writer.write(&filename, &image.bytes))
        .await
        .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))?
        .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))
}
