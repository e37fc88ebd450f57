use serde::{Deserialize, Serialize};

pub const USER_DISPLAY_NAME: &str = "You";
pub const ASSISTANT_DISPLAY_NAME: &str = "Credit Assistant";
/// Shown when a completed document carries no `assistant` block.
pub const FALLBACK_ASSISTANT_REPLY: &str = "Artifacts updated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation; never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub name: String,
    pub time: String,
    pub content: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}
