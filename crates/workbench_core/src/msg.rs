use crate::{ArtifactTab, RequestId, RoutingStepPatch, SessionSnapshot, UploadId, UploadReceipt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the chat input box.
    InputChanged(String),
    /// User submitted the current input; `at` is the wall-clock display time.
    Submitted { at: String },
    /// User abandoned the in-flight request.
    CancelRequested,
    /// User switched the visible artifact tab.
    TabSelected(ArtifactTab),
    /// User picked a translation version to display.
    TranslationSelected(usize),
    /// User started a new case: conversation and artifacts are reset.
    NewCase,
    /// User asked for the report export.
    ExportRequested,
    /// A local document was added to the tray.
    DocumentAdded {
        name: String,
        kind: String,
        content: String,
    },
    DocumentContentEdited { id: String, content: String },
    DocumentTagsEdited { id: String, tags: Vec<String> },
    DocumentRemoved { id: String },
    DocumentSelected(Option<String>),
    /// User picked a PDF to upload.
    UploadRequested { path: String },
    UploadFinished {
        upload_id: UploadId,
        result: Result<UploadReceipt, String>,
    },
    /// Restore a session persisted by a previous run.
    RestoreSession(SessionSnapshot),
    /// Response headers arrived for the request.
    StreamOpened { request_id: RequestId },
    /// A `chunk` record of partial document text.
    StreamChunk { request_id: RequestId, text: String },
    /// A live pipeline step announced by the backend.
    RoutingUpdate {
        request_id: RequestId,
        step: RoutingStepPatch,
    },
    /// A `done` record: the accumulated buffer should now be a complete document.
    StreamDone { request_id: RequestId, at: String },
    /// An `error` record sent by the backend.
    StreamError { request_id: RequestId, message: String },
    /// A `data:` record that could not be decoded.
    RecordRejected { request_id: RequestId, detail: String },
    /// Transport failure: connection error, non-OK status, oversized body.
    RequestFailed { request_id: RequestId, message: String },
    /// The request is over, whatever the outcome.
    RequestFinished { request_id: RequestId },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
