use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use workbench_logging::{wb_debug, wb_info};

use crate::client::{ArtifactClient, ChannelEventSink, ClientSettings, ReqwestArtifactClient};
use crate::types::{EngineEvent, FetchError, RequestId, UploadId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(FetchError),
}

enum EngineCommand {
    Start {
        request_id: RequestId,
        body: serde_json::Value,
    },
    Cancel {
        request_id: RequestId,
    },
    Upload {
        upload_id: UploadId,
        path: PathBuf,
    },
    SaveTags {
        tag_key: String,
        tags: Vec<String>,
    },
}

type InFlight = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Locks the token registry, recovering it from a poisoned lock.
fn tokens(in_flight: &InFlight) -> MutexGuard<'_, HashMap<RequestId, CancellationToken>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs network work on a background runtime; the caller polls for events.
///
/// Dropping the handle stops the worker thread and aborts in-flight requests.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = ReqwestArtifactClient::new(settings).map_err(EngineError::Client)?;
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<dyn ArtifactClient>) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let in_flight: InFlight = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&runtime, &client, &in_flight, &event_tx, command);
            }
            wb_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn start(&self, request_id: RequestId, body: serde_json::Value) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Start { request_id, body });
    }

    /// Aborts a request; its `StreamFinished` still arrives, carrying
    /// `FailureKind::Cancelled`.
    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { request_id });
    }

    pub fn upload(&self, upload_id: UploadId, path: impl Into<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::Upload {
            upload_id,
            path: path.into(),
        });
    }

    /// Stores the tags of an uploaded document under its content key.
    pub fn save_tags(&self, tag_key: impl Into<String>, tags: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::SaveTags {
            tag_key: tag_key.into(),
            tags,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    client: &Arc<dyn ArtifactClient>,
    in_flight: &InFlight,
    event_tx: &mpsc::Sender<EngineEvent>,
    command: EngineCommand,
) {
    match command {
        EngineCommand::Start { request_id, body } => {
            let token = CancellationToken::new();
            if let Some(previous) = tokens(in_flight).insert(request_id, token.clone()) {
                previous.cancel();
            }
            let client = client.clone();
            let in_flight = in_flight.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                wb_info!("Starting request {}", request_id);
                let sink = ChannelEventSink::new(event_tx.clone());
                let result = client
                    .stream_artifacts(request_id, &body, &sink, &token)
                    .await;
                tokens(&in_flight).remove(&request_id);
                if let Err(err) = &result {
                    wb_info!("Request {} ended: {}", request_id, err);
                }
                let _ = event_tx.send(EngineEvent::StreamFinished { request_id, result });
            });
        }
        EngineCommand::Cancel { request_id } => {
            let token = tokens(in_flight).remove(&request_id);
            match token {
                Some(token) => {
                    wb_info!("Cancelling request {}", request_id);
                    token.cancel();
                }
                None => wb_debug!("Cancel for unknown request {}", request_id),
            }
        }
        EngineCommand::Upload { upload_id, path } => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                wb_info!("Uploading {}", path.display());
                let result = client.upload_pdf(&path).await;
                let _ = event_tx.send(EngineEvent::UploadFinished { upload_id, result });
            });
        }
        EngineCommand::SaveTags { tag_key, tags } => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                wb_debug!("Saving {} tags for {}", tags.len(), tag_key);
                let result = client.save_tags(&tag_key, &tags).await;
                let _ = event_tx.send(EngineEvent::TagsSaved { tag_key, result });
            });
        }
    }
}
