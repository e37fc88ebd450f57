use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use workbench_engine::{
    ArtifactClient, EngineEvent, EngineHandle, EventSink, FailureKind, FetchError, RequestId,
    StreamEvent, StreamStats, UploadReceipt,
};

/// Emits one chunk then waits for cancellation when the body asks it to hang.
struct ScriptedClient;

#[async_trait::async_trait]
impl ArtifactClient for ScriptedClient {
    async fn stream_artifacts(
        &self,
        request_id: RequestId,
        body: &serde_json::Value,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<StreamStats, FetchError> {
        sink.emit(EngineEvent::StreamOpened { request_id });
        sink.emit(EngineEvent::Stream {
            request_id,
            event: StreamEvent::Chunk("{}".to_string()),
        });
        if body["hang"] == true {
            cancel.cancelled().await;
            return Err(FetchError {
                kind: FailureKind::Cancelled,
                message: String::new(),
            });
        }
        Ok(StreamStats {
            records: 1,
            ..StreamStats::default()
        })
    }

    async fn upload_pdf(&self, path: &Path) -> Result<UploadReceipt, FetchError> {
        Ok(UploadReceipt {
            id: path.file_stem().map(|s| s.to_string_lossy().into_owned()),
            pages: Some(1),
            tag_key: "k".to_string(),
        })
    }

    async fn save_tags(&self, tag_key: &str, _tags: &[String]) -> Result<(), FetchError> {
        if tag_key.is_empty() {
            return Err(FetchError {
                kind: FailureKind::HttpStatus(422),
                message: "missing tag key".to_string(),
            });
        }
        Ok(())
    }
}

fn collect_until_finished(engine: &EngineHandle, request_id: RequestId) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        let Some(event) = engine.recv_timeout(Duration::from_millis(50)) else {
            continue;
        };
        let finished = matches!(
            &event,
            EngineEvent::StreamFinished { request_id: id, .. } if *id == request_id
        );
        events.push(event);
        if finished {
            return events;
        }
    }
    panic!("request {request_id} never finished: {events:?}");
}

#[test]
fn finished_event_follows_stream_events() {
    let engine = EngineHandle::with_client(Arc::new(ScriptedClient)).unwrap();
    engine.start(1, json!({}));

    let events = collect_until_finished(&engine, 1);
    assert_eq!(
        events,
        vec![
            EngineEvent::StreamOpened { request_id: 1 },
            EngineEvent::Stream {
                request_id: 1,
                event: StreamEvent::Chunk("{}".to_string()),
            },
            EngineEvent::StreamFinished {
                request_id: 1,
                result: Ok(StreamStats {
                    records: 1,
                    ..StreamStats::default()
                }),
            },
        ]
    );
}

#[test]
fn cancel_resolves_hanging_request() {
    let engine = EngineHandle::with_client(Arc::new(ScriptedClient)).unwrap();
    engine.start(2, json!({"hang": true}));
    engine.cancel(2);

    let events = collect_until_finished(&engine, 2);
    let Some(EngineEvent::StreamFinished { result, .. }) = events.last() else {
        panic!("missing finish event");
    };
    assert_eq!(result.as_ref().unwrap_err().kind, FailureKind::Cancelled);
}

#[test]
fn upload_reports_receipt() {
    let engine = EngineHandle::with_client(Arc::new(ScriptedClient)).unwrap();
    engine.upload(9, "/tmp/memo.pdf");

    let event = engine.recv_timeout(Duration::from_secs(5));
    assert_eq!(
        event,
        Some(EngineEvent::UploadFinished {
            upload_id: 9,
            result: Ok(UploadReceipt {
                id: Some("memo".to_string()),
                pages: Some(1),
                tag_key: "k".to_string(),
            }),
        })
    );
}

#[test]
fn saved_tags_are_acknowledged_per_key() {
    let engine = EngineHandle::with_client(Arc::new(ScriptedClient)).unwrap();
    engine.save_tags("abc", vec!["loan".to_string()]);

    let event = engine.recv_timeout(Duration::from_secs(5));
    assert_eq!(
        event,
        Some(EngineEvent::TagsSaved {
            tag_key: "abc".to_string(),
            result: Ok(()),
        })
    );
}

#[test]
fn cancelling_unknown_request_is_harmless() {
    let engine = EngineHandle::with_client(Arc::new(ScriptedClient)).unwrap();
    engine.cancel(42);
    engine.start(3, json!({}));
    let events = collect_until_finished(&engine, 3);
    assert_eq!(events.len(), 3);
}
