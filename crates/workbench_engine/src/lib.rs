//! Workbench engine: streaming transport, upload, and file output.
mod client;
mod engine;
mod persist;
mod record;
mod sse;
mod types;

pub use client::{
    ArtifactClient, ChannelEventSink, ClientSettings, EventSink, ReqwestArtifactClient,
    ARTIFACTS_PATH, DEFAULT_API_BASE, TAGS_PATH, UPLOAD_PATH,
};
pub use engine::{EngineError, EngineHandle};
pub use persist::{OutputDir, PersistError};
pub use record::{decode_record, is_truthy, RecordError};
pub use sse::{SseDecoder, DATA_PREFIX};
pub use types::{
    EngineEvent, FailureKind, FetchError, RequestId, RoutingUpdate, StreamEvent, StreamStats,
    UploadId, UploadReceipt,
};
