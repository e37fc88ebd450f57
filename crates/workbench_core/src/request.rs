use serde::Serialize;

use crate::{ChatMessage, Document, Role};

/// Body of `POST /api/artifacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRequest {
    pub messages: Vec<WireMessage>,
    pub documents: Vec<Document>,
    pub stream: bool,
    pub system_context: SystemContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// What the backend should know about the current workbench state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SystemContext {
    pub has_summary: bool,
    pub has_translation: bool,
    pub has_memo: bool,
    pub translation_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_doc_name: Option<String>,
}
