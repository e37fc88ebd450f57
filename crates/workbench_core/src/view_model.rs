use crate::{
    ArtifactState, ArtifactTab, ChatMessage, Document, PipelineStage, RoutingStep, SessionPhase,
    TranslationVersion,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: SessionPhase,
    pub input: String,
    pub messages: Vec<ChatMessage>,
    /// Live "typing" view of the accumulated buffer.
    pub streaming_text: Option<String>,
    pub routing: Vec<RoutingStep>,
    pub optimistic_stage: Option<PipelineStage>,
    pub routing_confirmed: bool,
    pub active_tab: ArtifactTab,
    pub artifacts: ArtifactState,
    pub active_translation: Option<usize>,
    pub documents: Vec<Document>,
    pub selected_document: Option<String>,
    pub pending_uploads: usize,
    pub error: Option<String>,
    pub last_update: Option<String>,
    pub busy: bool,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn current_translation(&self) -> Option<&TranslationVersion> {
        self.active_translation
            .and_then(|index| self.artifacts.translations.get(index))
    }
}
