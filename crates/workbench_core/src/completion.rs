use serde_json::Value;

use crate::ArtifactDocument;

/// Parse failures, classified by where in the stream they happen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// A single `data:` record was unreadable; the stream goes on.
    #[error("malformed stream record: {0}")]
    Transient(String),
    /// The accumulated buffer did not form a document when the stream completed.
    #[error("completed stream is not a valid artifact document: {0}")]
    Fatal(String),
}

/// Parses the whole accumulated buffer as one artifact document.
///
/// Only text that is not a JSON object fails. Fields with an unexpected
/// shape are read as absent.
pub fn parse_completed(buffer: &str) -> Result<ArtifactDocument, ParseFailure> {
    let value: Value =
        serde_json::from_str(buffer).map_err(|err| ParseFailure::Fatal(err.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::Fatal("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|err| ParseFailure::Fatal(err.to_string()))
}
