use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use workbench_logging::{wb_debug, wb_info, wb_warn};

use crate::artifacts::{reduce, ArtifactState};
use crate::chat::{
    ChatMessage, Role, ASSISTANT_DISPLAY_NAME, FALLBACK_ASSISTANT_REPLY, USER_DISPLAY_NAME,
};
use crate::completion::{parse_completed, ParseFailure};
use crate::document::{normalize_tags, Document};
use crate::request::{ArtifactRequest, SystemContext, WireMessage};
use crate::routing::{RoutingBoard, RoutingStepPatch};
use crate::view_model::AppViewModel;

pub type RequestId = u64;
pub type UploadId = u64;

const UPLOAD_FAILED_PREFIX: &str = "Upload failed: ";

/// Lifecycle of the one artifact request allowed in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Done,
    Failed,
}

impl SessionPhase {
    fn is_receiving(self) -> bool {
        matches!(self, SessionPhase::Sending | SessionPhase::Streaming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactTab {
    #[default]
    Summary,
    Translation,
    Memo,
}

/// What a successful PDF upload reports back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    pub id: Option<String>,
    pub pages: Option<u32>,
    pub tag_key: Option<String>,
}

/// The part of the state worth keeping across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub messages: Vec<ChatMessage>,
    pub artifacts: ArtifactState,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamSession {
    request_id: RequestId,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    phase: SessionPhase,
    messages: Vec<ChatMessage>,
    artifacts: ArtifactState,
    active_tab: ArtifactTab,
    active_translation: Option<usize>,
    routing: RoutingBoard,
    documents: Vec<Document>,
    selected_document: Option<String>,
    pending_uploads: BTreeMap<UploadId, String>,
    stream: Option<StreamSession>,
    error: Option<String>,
    last_update: Option<String>,
    next_request_id: RequestId,
    next_message_id: u64,
    next_upload_id: UploadId,
    next_document_seq: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn artifacts(&self) -> &ArtifactState {
        &self.artifacts
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Text accumulated so far for the in-flight request.
    pub fn streaming_buffer(&self) -> Option<&str> {
        self.stream.as_ref().map(|s| s.buffer.as_str())
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.stream.as_ref().map(|s| s.request_id)
    }

    pub fn is_busy(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    pub fn has_pending_uploads(&self) -> bool {
        !self.pending_uploads.is_empty()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            input: self.input.clone(),
            messages: self.messages.clone(),
            streaming_text: self
                .stream
                .as_ref()
                .filter(|s| self.phase.is_receiving() && !s.buffer.is_empty())
                .map(|s| s.buffer.clone()),
            routing: self.routing.steps(),
            optimistic_stage: self.routing.optimistic_stage(),
            routing_confirmed: self.routing.confirmed().is_some(),
            active_tab: self.active_tab,
            artifacts: self.artifacts.clone(),
            active_translation: self.active_translation,
            documents: self.documents.clone(),
            selected_document: self.selected_document.clone(),
            pending_uploads: self.pending_uploads.len(),
            error: self.error.clone(),
            last_update: self.last_update.clone(),
            busy: self.is_busy(),
            dirty: self.dirty,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.messages.clone(),
            artifacts: self.artifacts.clone(),
            documents: self.documents.clone(),
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.mark_dirty();
        }
    }

    /// Starts a request from the current input; `None` when busy or the input is blank.
    pub(crate) fn begin_request(&mut self, at: String) -> Option<(RequestId, ArtifactRequest)> {
        if self.is_busy() {
            wb_debug!("submit ignored: request already in flight");
            return None;
        }
        let content = self.input.trim().to_string();
        if content.is_empty() {
            return None;
        }

        self.push_message(Role::User, USER_DISPLAY_NAME, at, content, Vec::new());
        self.input.clear();
        self.error = None;
        self.routing.clear();
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.stream = Some(StreamSession {
            request_id,
            buffer: String::new(),
        });
        self.phase = SessionPhase::Sending;
        self.mark_dirty();

        wb_info!(
            "request {} started with {} messages and {} documents",
            request_id,
            self.messages.len(),
            self.documents.len()
        );
        Some((request_id, self.build_request()))
    }

    fn build_request(&self) -> ArtifactRequest {
        let selected = self
            .selected_document
            .as_deref()
            .and_then(|id| self.documents.iter().find(|doc| doc.id == id));
        ArtifactRequest {
            messages: self.messages.iter().map(WireMessage::from).collect(),
            documents: self.documents.clone(),
            stream: true,
            system_context: SystemContext {
                has_summary: self.artifacts.has_summary(),
                has_translation: !self.artifacts.translations.is_empty(),
                has_memo: self.artifacts.has_memo(),
                translation_count: self.artifacts.translations.len(),
                selected_doc_id: selected.map(|doc| doc.id.clone()),
                selected_doc_name: selected.map(|doc| doc.name.clone()),
            },
        }
    }

    /// True when `request_id` is the in-flight request still receiving data.
    fn is_receiving(&self, request_id: RequestId) -> bool {
        self.phase.is_receiving() && self.active_request() == Some(request_id)
    }

    fn enter_streaming(&mut self) {
        if self.phase == SessionPhase::Sending {
            self.phase = SessionPhase::Streaming;
            self.routing.start();
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_opened(&mut self, request_id: RequestId) {
        if self.is_receiving(request_id) {
            self.enter_streaming();
        } else {
            wb_debug!("ignoring stale open for request {}", request_id);
        }
    }

    pub(crate) fn apply_chunk(&mut self, request_id: RequestId, text: &str) {
        if !self.is_receiving(request_id) {
            wb_debug!("ignoring stale chunk for request {}", request_id);
            return;
        }
        self.enter_streaming();
        if let Some(stream) = self.stream.as_mut() {
            stream.buffer.push_str(text);
            self.routing.observe(&stream.buffer);
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_routing_update(&mut self, request_id: RequestId, step: RoutingStepPatch) {
        if !self.is_receiving(request_id) {
            return;
        }
        self.enter_streaming();
        if self.routing.report(step) {
            self.mark_dirty();
        }
    }

    /// Completion Parser: folds the whole buffer into the artifacts.
    ///
    /// Returns whether the document was accepted.
    pub(crate) fn apply_done(&mut self, request_id: RequestId, at: String) -> bool {
        if !self.is_receiving(request_id) {
            wb_debug!("ignoring stale done for request {}", request_id);
            return false;
        }
        let buffer = self
            .stream
            .as_mut()
            .map(|s| std::mem::take(&mut s.buffer))
            .unwrap_or_default();
        self.phase = SessionPhase::Done;
        self.mark_dirty();

        let mut doc = match parse_completed(&buffer) {
            Ok(doc) => doc,
            Err(failure) => {
                // Routing keeps its last projected state so the stall stays visible.
                wb_warn!("request {}: {} ({} bytes)", request_id, failure, buffer.len());
                return false;
            }
        };

        let artifacts = std::mem::take(&mut self.artifacts);
        let (artifacts, appended) = reduce(artifacts, &doc, &at);
        self.artifacts = artifacts;
        if appended.is_some() {
            self.active_translation = appended;
        }

        match doc.routing.take() {
            Some(steps) => self.routing.confirm(steps),
            None => self.routing.finish_all(),
        }

        let reply = doc.assistant.take().unwrap_or_default();
        let content = if reply.content.is_empty() {
            FALLBACK_ASSISTANT_REPLY.to_string()
        } else {
            reply.content
        };
        self.push_message(
            Role::Assistant,
            ASSISTANT_DISPLAY_NAME,
            at.clone(),
            content,
            reply.bullets,
        );
        self.last_update = Some(at);
        wb_info!(
            "request {} completed; {} translation versions",
            request_id,
            self.artifacts.translations.len()
        );
        true
    }

    pub(crate) fn apply_failure(&mut self, request_id: RequestId, message: String) {
        if !self.is_receiving(request_id) {
            wb_debug!("ignoring failure for inactive request {}: {}", request_id, message);
            return;
        }
        wb_warn!("request {} failed: {}", request_id, message);
        if let Some(stream) = self.stream.as_mut() {
            stream.buffer.clear();
        }
        self.phase = SessionPhase::Failed;
        self.error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn apply_rejected_record(&self, request_id: RequestId, detail: String) {
        let failure = ParseFailure::Transient(detail);
        wb_debug!("request {}: {}", request_id, failure);
    }

    /// Always returns to idle for the active request, whatever path ended it.
    pub(crate) fn apply_finished(&mut self, request_id: RequestId) {
        if self.active_request() != Some(request_id) {
            return;
        }
        if self.phase.is_receiving() {
            wb_info!("request {} ended without a done record", request_id);
        }
        self.stream = None;
        self.phase = SessionPhase::Idle;
        self.mark_dirty();
    }

    /// Drops the in-flight request; returns its id so the caller can cancel the IO.
    pub(crate) fn abandon_request(&mut self) -> Option<RequestId> {
        let request_id = self.active_request()?;
        self.stream = None;
        self.phase = SessionPhase::Idle;
        self.mark_dirty();
        wb_info!("request {} abandoned", request_id);
        Some(request_id)
    }

    pub(crate) fn reset_case(&mut self) {
        self.input.clear();
        self.messages.clear();
        self.artifacts = ArtifactState::default();
        self.active_tab = ArtifactTab::default();
        self.active_translation = None;
        self.routing.clear();
        self.selected_document = None;
        self.error = None;
        self.last_update = None;
        self.mark_dirty();
    }

    pub(crate) fn select_tab(&mut self, tab: ArtifactTab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.mark_dirty();
        }
    }

    pub(crate) fn select_translation(&mut self, index: usize) {
        if index < self.artifacts.translations.len() && self.active_translation != Some(index) {
            self.active_translation = Some(index);
            self.mark_dirty();
        }
    }

    pub(crate) fn active_translation(&self) -> Option<usize> {
        self.active_translation
    }

    pub(crate) fn add_document(&mut self, name: String, kind: String, content: String) -> String {
        let id = self.fresh_document_id();
        self.documents.push(Document::new(id.clone(), name, kind, content));
        self.mark_dirty();
        id
    }

    pub(crate) fn edit_document_content(&mut self, id: &str, content: String) {
        if let Some(doc) = self.documents.iter_mut().find(|doc| doc.id == id) {
            doc.set_content(content);
            self.mark_dirty();
        }
    }

    /// Returns the document's content key and new tags when the backend keeps a copy.
    pub(crate) fn edit_document_tags(
        &mut self,
        id: &str,
        tags: Vec<String>,
    ) -> Option<(String, Vec<String>)> {
        let doc = self.documents.iter_mut().find(|doc| doc.id == id)?;
        doc.tags = normalize_tags(tags);
        let synced = doc.tag_key.clone().map(|key| (key, doc.tags.clone()));
        self.mark_dirty();
        synced
    }

    pub(crate) fn remove_document(&mut self, id: &str) {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id != id);
        if self.documents.len() != before {
            if self.selected_document.as_deref() == Some(id) {
                self.selected_document = None;
            }
            self.mark_dirty();
        }
    }

    pub(crate) fn select_document(&mut self, id: Option<String>) {
        let exists = id
            .as_deref()
            .is_none_or(|id| self.documents.iter().any(|doc| doc.id == id));
        if exists && self.selected_document != id {
            self.selected_document = id;
            self.mark_dirty();
        }
    }

    pub(crate) fn register_upload(&mut self, path: String) -> UploadId {
        self.next_upload_id += 1;
        self.pending_uploads.insert(self.next_upload_id, path);
        self.clear_upload_error();
        self.mark_dirty();
        self.next_upload_id
    }

    pub(crate) fn complete_upload(
        &mut self,
        upload_id: UploadId,
        result: Result<UploadReceipt, String>,
    ) {
        let Some(path) = self.pending_uploads.remove(&upload_id) else {
            wb_debug!("ignoring unknown upload {}", upload_id);
            return;
        };
        match result {
            Ok(receipt) => {
                let name = Path::new(&path)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                let id = match receipt.id {
                    Some(id) if !self.documents.iter().any(|doc| doc.id == id) => id,
                    _ => self.fresh_document_id(),
                };
                let mut doc = Document::new(id, name, "PDF", String::new());
                if let Some(pages) = receipt.pages {
                    doc.pages = pages.max(1);
                }
                doc.tag_key = receipt.tag_key;
                wb_info!("upload {} stored as document {}", upload_id, doc.id);
                self.documents.push(doc);
                self.clear_upload_error();
            }
            Err(message) => {
                wb_warn!("upload {} of {} failed: {}", upload_id, path, message);
                self.error = Some(format!("{UPLOAD_FAILED_PREFIX}{message}"));
            }
        }
        self.mark_dirty();
    }

    /// Request errors stay until the next submit.
    fn clear_upload_error(&mut self) {
        if self
            .error
            .as_deref()
            .is_some_and(|error| error.starts_with(UPLOAD_FAILED_PREFIX))
        {
            self.error = None;
        }
    }

    pub(crate) fn restore(&mut self, snapshot: SessionSnapshot) {
        self.next_message_id = snapshot
            .messages
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(0);
        self.active_translation = snapshot.artifacts.translations.len().checked_sub(1);
        self.messages = snapshot.messages;
        self.artifacts = snapshot.artifacts;
        self.documents = snapshot.documents;
        self.selected_document = None;
        self.mark_dirty();
    }

    fn push_message(
        &mut self,
        role: Role,
        name: &str,
        time: String,
        content: String,
        bullets: Vec<String>,
    ) {
        self.next_message_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_message_id,
            role,
            name: name.to_string(),
            time,
            content,
            bullets,
            attachment: None,
        });
    }

    fn fresh_document_id(&mut self) -> String {
        loop {
            self.next_document_seq += 1;
            let id = format!("doc-{}", self.next_document_seq);
            if !self.documents.iter().any(|doc| doc.id == id) {
                return id;
            }
        }
    }
}
