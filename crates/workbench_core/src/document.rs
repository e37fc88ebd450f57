use serde::{Deserialize, Serialize};

/// Characters per estimated page.
pub const CHARS_PER_PAGE: usize = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pages: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            pages: estimate_pages(&content),
            tags: Vec::new(),
            content,
            tag_key: None,
        }
    }

    /// Replaces the content and recomputes the page estimate.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.pages = estimate_pages(&self.content);
    }
}

/// One page per started block of [`CHARS_PER_PAGE`] characters, never less than one.
pub fn estimate_pages(content: &str) -> u32 {
    let chars = content.chars().count();
    let pages = chars.div_ceil(CHARS_PER_PAGE).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Trims tags, drops empties and keeps the first occurrence of duplicates.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || normalized.iter().any(|existing| existing == tag) {
            continue;
        }
        normalized.push(tag.to_string());
    }
    normalized
}
