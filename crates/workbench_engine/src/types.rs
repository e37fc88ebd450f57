use std::fmt;

use serde::Deserialize;

use crate::record::RecordError;

pub type RequestId = u64;
pub type UploadId = u64;

/// A live pipeline step announced mid-stream by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RoutingUpdate {
    pub id: Option<String>,
    pub label: Option<String>,
    pub status: Option<String>,
    pub eta: Option<String>,
}

/// One meaningful item carried by a `data:` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(String),
    RoutingUpdate(RoutingUpdate),
    Trace(serde_json::Value),
    Done,
    ServerError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Response headers arrived with a success status.
    StreamOpened { request_id: RequestId },
    Stream {
        request_id: RequestId,
        event: StreamEvent,
    },
    RecordRejected {
        request_id: RequestId,
        error: RecordError,
    },
    /// Always the last event of a request.
    StreamFinished {
        request_id: RequestId,
        result: Result<StreamStats, FetchError>,
    },
    UploadFinished {
        upload_id: UploadId,
        result: Result<UploadReceipt, FetchError>,
    },
    TagsSaved {
        tag_key: String,
        result: Result<(), FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamStats {
    pub bytes: u64,
    pub records: usize,
    pub saw_done: bool,
    /// Partial last line dropped at end of stream.
    pub discarded_tail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    pub id: Option<String>,
    pub pages: Option<u32>,
    /// Hex MD5 of the uploaded bytes; the backend keys document tags by it.
    pub tag_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// The stream carried an `error` record.
    ServerReported,
    Cancelled,
    Io,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::ServerReported => write!(f, "server reported an error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
