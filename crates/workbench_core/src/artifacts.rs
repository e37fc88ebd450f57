//! Artifact model and the merge rules applied when a streamed document completes.
//!
//! Summary and memo hold the current best draft and are overwritten field by
//! field. Translations are historized: every non-empty translation becomes a
//! new immutable version appended to the list.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::routing::RoutingStepPatch;

pub const TRANSLATION_TITLE_PREFIX: &str = "翻譯 #";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Borrower {
    pub name: String,
    pub description: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metric {
    #[serde(deserialize_with = "lenient::text")]
    pub label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub value: String,
    #[serde(deserialize_with = "lenient::text")]
    pub delta: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    #[serde(deserialize_with = "lenient::text")]
    pub label: String,
    /// `High`, `Medium` or `Low` as reported by the backend.
    #[serde(deserialize_with = "lenient::text")]
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub output: String,
    pub borrower: Borrower,
    pub metrics: Vec<Metric>,
    pub risks: Vec<Risk>,
    pub source_doc_id: String,
    pub source_doc_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Clause {
    #[serde(deserialize_with = "lenient::text")]
    pub original: String,
    #[serde(deserialize_with = "lenient::text")]
    pub translated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationVersion {
    pub id: String,
    pub timestamp: String,
    pub title: String,
    pub output: String,
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub source_doc_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoSection {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Memo {
    pub output: String,
    pub sections: Vec<MemoSection>,
    pub recommendation: String,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactState {
    pub summary: Summary,
    pub translations: Vec<TranslationVersion>,
    pub memo: Memo,
}

impl ArtifactState {
    pub fn has_summary(&self) -> bool {
        !self.summary.output.is_empty()
    }

    pub fn has_memo(&self) -> bool {
        !self.memo.output.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BorrowerPatch {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SummaryPatch {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub output: Option<String>,
    #[serde(deserialize_with = "lenient::optional_object")]
    pub borrower: Option<BorrowerPatch>,
    #[serde(deserialize_with = "lenient::optional_list")]
    pub metrics: Option<Vec<Metric>>,
    #[serde(deserialize_with = "lenient::optional_list")]
    pub risks: Option<Vec<Risk>>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub source_doc_id: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text_list")]
    pub source_doc_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TranslationPatch {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub output: Option<String>,
    #[serde(deserialize_with = "lenient::optional_list")]
    pub clauses: Option<Vec<Clause>>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub source_doc_id: Option<String>,
}

impl TranslationPatch {
    /// A translation is worth a new version only when it carries text or clauses.
    pub fn has_content(&self) -> bool {
        let has_output = self.output.as_deref().is_some_and(|o| !o.is_empty());
        let has_clauses = self.clauses.as_ref().is_some_and(|c| !c.is_empty());
        has_output || has_clauses
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MemoPatch {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub output: Option<String>,
    #[serde(deserialize_with = "lenient::optional_list")]
    pub sections: Option<Vec<MemoSection>>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub recommendation: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AssistantReply {
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub bullets: Vec<String>,
}

/// The JSON document a stream spells out across its `chunk` records.
///
/// Every field is decoded on its own; a field of the wrong shape is absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ArtifactDocument {
    #[serde(deserialize_with = "lenient::optional_object")]
    pub assistant: Option<AssistantReply>,
    #[serde(deserialize_with = "lenient::optional_object")]
    pub summary: Option<SummaryPatch>,
    #[serde(deserialize_with = "lenient::optional_object")]
    pub translation: Option<TranslationPatch>,
    #[serde(deserialize_with = "lenient::optional_object")]
    pub memo: Option<MemoPatch>,
    #[serde(deserialize_with = "lenient::optional_list")]
    pub routing: Option<Vec<RoutingStepPatch>>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub reasoning_summary: Option<String>,
}

/// Merges a completed document into the artifact state.
///
/// Returns the next state and, when a translation version was appended, its index.
pub fn reduce(
    mut artifacts: ArtifactState,
    doc: &ArtifactDocument,
    timestamp: &str,
) -> (ArtifactState, Option<usize>) {
    if let Some(patch) = &doc.summary {
        merge_summary(&mut artifacts.summary, patch);
    }
    if let Some(patch) = &doc.memo {
        merge_memo(&mut artifacts.memo, patch);
    }

    let appended = match &doc.translation {
        Some(patch) if patch.has_content() => {
            let number = artifacts.translations.len() + 1;
            artifacts.translations.push(TranslationVersion {
                id: format!("translation-{number}"),
                timestamp: timestamp.to_string(),
                title: format!("{TRANSLATION_TITLE_PREFIX}{number}"),
                output: patch.output.clone().unwrap_or_default(),
                clauses: patch.clauses.clone().unwrap_or_default(),
                source_doc_id: patch.source_doc_id.clone().unwrap_or_default(),
            });
            Some(number - 1)
        }
        _ => None,
    };

    (artifacts, appended)
}

fn merge_summary(summary: &mut Summary, patch: &SummaryPatch) {
    override_with(&mut summary.output, &patch.output);
    if let Some(borrower) = &patch.borrower {
        override_with(&mut summary.borrower.name, &borrower.name);
        override_with(&mut summary.borrower.description, &borrower.description);
        override_with(&mut summary.borrower.rating, &borrower.rating);
    }
    override_with(&mut summary.metrics, &patch.metrics);
    override_with(&mut summary.risks, &patch.risks);
    override_with(&mut summary.source_doc_id, &patch.source_doc_id);
    override_with(&mut summary.source_doc_ids, &patch.source_doc_ids);
}

fn merge_memo(memo: &mut Memo, patch: &MemoPatch) {
    override_with(&mut memo.output, &patch.output);
    override_with(&mut memo.sections, &patch.sections);
    override_with(&mut memo.recommendation, &patch.recommendation);
    override_with(&mut memo.conditions, &patch.conditions);
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
