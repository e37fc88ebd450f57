//! Workbench core: pure state machine for streamed artifact requests.
mod artifacts;
mod chat;
mod completion;
mod document;
mod effect;
mod lenient;
mod msg;
mod report;
mod request;
mod routing;
mod state;
mod update;
mod view_model;

pub use artifacts::{
    reduce, ArtifactDocument, ArtifactState, AssistantReply, Borrower, BorrowerPatch, Clause,
    Memo, MemoPatch, MemoSection, Metric, Risk, Summary, SummaryPatch, TranslationPatch,
    TranslationVersion, TRANSLATION_TITLE_PREFIX,
};
pub use chat::{ChatMessage, Role, ASSISTANT_DISPLAY_NAME, FALLBACK_ASSISTANT_REPLY};
pub use completion::{parse_completed, ParseFailure};
pub use document::{estimate_pages, normalize_tags, Document, CHARS_PER_PAGE};
pub use effect::Effect;
pub use msg::Msg;
pub use report::{render_html, render_markdown, REPORT_TITLE};
pub use request::{ArtifactRequest, SystemContext, WireMessage};
pub use routing::{
    canned_steps, project_stage, PipelineStage, RoutingBoard, RoutingStep, RoutingStepPatch,
    StepStatus, ETA_COMPLETE,
};
pub use state::{
    AppState, ArtifactTab, RequestId, SessionPhase, SessionSnapshot, UploadId, UploadReceipt,
};
pub use update::update;
pub use view_model::AppViewModel;
