use crate::{ArtifactRequest, RequestId, SessionSnapshot, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRequest {
        request_id: RequestId,
        request: ArtifactRequest,
    },
    CancelRequest { request_id: RequestId },
    UploadPdf { upload_id: UploadId, path: String },
    /// Sends the tags of an uploaded document to the backend.
    SyncTags { tag_key: String, tags: Vec<String> },
    PersistSession(SessionSnapshot),
    ExportReport { markdown: String, html: String },
}
