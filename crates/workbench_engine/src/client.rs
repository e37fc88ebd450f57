use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use md5::{Digest, Md5};
use tokio_util::sync::CancellationToken;
use url::Url;
use workbench_logging::{wb_debug, wb_info};

use crate::record::decode_record;
use crate::sse::SseDecoder;
use crate::types::{
    EngineEvent, FailureKind, FetchError, RequestId, StreamEvent, StreamStats, UploadReceipt,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const ARTIFACTS_PATH: &str = "api/artifacts";
pub const UPLOAD_PATH: &str = "api/upload_pdf";
pub const TAGS_PATH: &str = "api/tags";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub connect_timeout: Duration,
    /// Maximum silence between two reads of a streaming response.
    pub read_timeout: Duration,
    pub max_stream_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
            max_stream_bytes: 16 * 1024 * 1024,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait ArtifactClient: Send + Sync {
    /// Posts `body` and forwards decoded stream events to `sink` until the
    /// response ends, fails, or `cancel` fires.
    async fn stream_artifacts(
        &self,
        request_id: RequestId,
        body: &serde_json::Value,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<StreamStats, FetchError>;

    async fn upload_pdf(&self, path: &Path) -> Result<UploadReceipt, FetchError>;

    /// Replaces the backend's tags for the document with content key `tag_key`.
    async fn save_tags(&self, tag_key: &str, tags: &[String]) -> Result<(), FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestArtifactClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestArtifactClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let mut base = self.settings.api_base.trim_end_matches('/').to_string();
        base.push('/');
        Url::parse(&base)
            .and_then(|base| base.join(path))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_stream_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl ArtifactClient for ReqwestArtifactClient {
    async fn stream_artifacts(
        &self,
        request_id: RequestId,
        body: &serde_json::Value,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<StreamStats, FetchError> {
        let url = self.endpoint(ARTIFACTS_PATH)?;
        let send = self
            .client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            response = send => response.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_stream_bytes {
                return Err(self.too_large(content_len));
            }
        }

        sink.emit(EngineEvent::StreamOpened { request_id });

        let mut stats = StreamStats::default();
        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(map_reqwest_error)?;
            stats.bytes += chunk.len() as u64;
            if stats.bytes > self.settings.max_stream_bytes {
                return Err(self.too_large(stats.bytes));
            }

            for payload in decoder.push(&chunk) {
                if cancel.is_cancelled() {
                    return Err(cancelled());
                }
                stats.records += 1;
                let events = match decode_record(&payload) {
                    Ok(events) => events,
                    Err(error) => {
                        sink.emit(EngineEvent::RecordRejected { request_id, error });
                        continue;
                    }
                };
                for event in events {
                    if let StreamEvent::ServerError(message) = &event {
                        let message = message.clone();
                        sink.emit(EngineEvent::Stream { request_id, event });
                        return Err(FetchError::new(FailureKind::ServerReported, message));
                    }
                    stats.saw_done |= event == StreamEvent::Done;
                    sink.emit(EngineEvent::Stream { request_id, event });
                }
            }
        }

        stats.discarded_tail = decoder.finish();
        if let Some(tail) = stats.discarded_tail.as_deref() {
            wb_debug!(
                "Request {} ended with {} unterminated bytes",
                request_id,
                tail.len()
            );
        }
        wb_info!(
            "Request {} streamed {} records ({} bytes)",
            request_id,
            stats.records,
            stats.bytes
        );
        Ok(stats)
    }

    async fn upload_pdf(&self, path: &Path) -> Result<UploadReceipt, FetchError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;
        let tag_key = format!("{:x}", Md5::digest(&bytes));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        Ok(UploadReceipt {
            id: body.id.filter(|id| !id.is_empty()),
            pages: body.pages.as_ref().and_then(page_count),
            tag_key,
        })
    }

    async fn save_tags(&self, tag_key: &str, tags: &[String]) -> Result<(), FetchError> {
        let url = self.endpoint(TAGS_PATH)?;
        let response = self
            .client
            .post(url)
            .json(&TagUpdate { tag_key, tags })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        wb_debug!("Saved {} tags for {}", tags.len(), tag_key);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TagUpdate<'a> {
    tag_key: &'a str,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    pages: Option<serde_json::Value>,
}

fn page_count(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .and_then(|pages| u32::try_from(pages).ok())
}

fn cancelled() -> FetchError {
    FetchError::new(FailureKind::Cancelled, "")
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
