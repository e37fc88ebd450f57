use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use workbench_core::{Effect, Msg, RoutingStepPatch, UploadReceipt};
use workbench_engine::{EngineEvent, EngineHandle, FailureKind, OutputDir, StreamEvent};
use workbench_logging::{wb_debug, wb_error, wb_info, wb_warn};

use crate::export::write_report;
use crate::persistence::save_session;

pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Executes core effects against the engine and turns engine events back
/// into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    output: OutputDir,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output: OutputDir) -> Self {
        Self { engine, output }
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    /// Returns messages for effects that fail before reaching the engine.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut feedback = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartRequest {
                    request_id,
                    request,
                } => match serde_json::to_value(&request) {
                    Ok(body) => {
                        wb_info!(
                            "StartRequest request_id={} messages={} documents={}",
                            request_id,
                            request.messages.len(),
                            request.documents.len()
                        );
                        self.engine.start(request_id, body);
                    }
                    Err(err) => {
                        wb_error!("Failed to encode request {}: {}", request_id, err);
                        feedback.push(Msg::RequestFailed {
                            request_id,
                            message: err.to_string(),
                        });
                        feedback.push(Msg::RequestFinished { request_id });
                    }
                },
                Effect::CancelRequest { request_id } => self.engine.cancel(request_id),
                Effect::UploadPdf { upload_id, path } => self.engine.upload(upload_id, path),
                Effect::SyncTags { tag_key, tags } => self.engine.save_tags(tag_key, tags),
                Effect::PersistSession(snapshot) => save_session(&self.output, &snapshot),
                Effect::ExportReport { markdown, html } => {
                    match write_report(&self.output, &markdown, &html) {
                        Ok([md, html]) => {
                            println!("Report written to {} and {}", md.display(), html.display());
                        }
                        Err(err) => {
                            wb_error!("Report export failed: {}", err);
                            eprintln!("Report export failed: {err}");
                        }
                    }
                }
            }
        }
        feedback
    }

    pub fn next_event(&self, timeout: Duration) -> Option<EngineEvent> {
        self.engine.recv_timeout(timeout)
    }
}

pub fn translate_event(event: EngineEvent) -> Vec<Msg> {
    match event {
        EngineEvent::StreamOpened { request_id } => vec![Msg::StreamOpened { request_id }],
        EngineEvent::Stream { request_id, event } => match event {
            StreamEvent::Chunk(text) => vec![Msg::StreamChunk { request_id, text }],
            StreamEvent::RoutingUpdate(update) => vec![Msg::RoutingUpdate {
                request_id,
                step: RoutingStepPatch {
                    id: update.id,
                    label: update.label,
                    status: update.status,
                    eta: update.eta,
                },
            }],
            StreamEvent::Trace(trace) => {
                wb_debug!("trace_event request_id={} {}", request_id, trace);
                Vec::new()
            }
            StreamEvent::Done => vec![Msg::StreamDone {
                request_id,
                at: timestamp(),
            }],
            StreamEvent::ServerError(message) => vec![Msg::StreamError {
                request_id,
                message,
            }],
        },
        EngineEvent::RecordRejected { request_id, error } => vec![Msg::RecordRejected {
            request_id,
            detail: error.to_string(),
        }],
        EngineEvent::StreamFinished { request_id, result } => {
            let mut msgs = Vec::with_capacity(2);
            match result {
                Ok(stats) if !stats.saw_done => {
                    wb_warn!("Request {} ended without a done record", request_id);
                }
                Ok(_) => {}
                // Already reported through the error record, or asked for by the user.
                Err(err)
                    if matches!(err.kind, FailureKind::ServerReported | FailureKind::Cancelled) =>
                {
                    wb_debug!("Request {} closed: {}", request_id, err);
                }
                Err(err) => msgs.push(Msg::RequestFailed {
                    request_id,
                    message: err.to_string(),
                }),
            }
            msgs.push(Msg::RequestFinished { request_id });
            msgs
        }
        EngineEvent::UploadFinished { upload_id, result } => vec![Msg::UploadFinished {
            upload_id,
            result: result
                .map(|receipt| UploadReceipt {
                    id: receipt.id,
                    pages: receipt.pages,
                    tag_key: Some(receipt.tag_key),
                })
                .map_err(|err| err.to_string()),
        }],
        EngineEvent::TagsSaved { tag_key, result } => {
            match result {
                Ok(()) => wb_debug!("Tags saved for {}", tag_key),
                Err(err) => wb_warn!("Tags for {} were not saved: {}", tag_key, err),
            }
            Vec::new()
        }
    }
}
