use serde_json::Value;
use thiserror::Error;
use workbench_logging::wb_debug;

use crate::types::{RoutingUpdate, StreamEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not valid json: {0}")]
    InvalidJson(String),
    #[error("record is not a json object")]
    NotAnObject,
}

/// Decodes one `data:` payload.
///
/// A truthy `error` field wins over everything else in the record. Otherwise
/// events come out in field order `chunk`, `routing_update`, `trace_event`,
/// then `done`.
pub fn decode_record(payload: &str) -> Result<Vec<StreamEvent>, RecordError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| RecordError::InvalidJson(err.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(RecordError::NotAnObject);
    };

    if let Some(error) = fields.remove("error").filter(is_truthy) {
        let message = match error {
            Value::String(text) => text,
            other => other.to_string(),
        };
        return Ok(vec![StreamEvent::ServerError(message)]);
    }

    let mut events = Vec::new();
    if let Some(Value::String(chunk)) = fields.remove("chunk") {
        if !chunk.is_empty() {
            events.push(StreamEvent::Chunk(chunk));
        }
    }
    if let Some(update) = fields.remove("routing_update").filter(|v| !v.is_null()) {
        match serde_json::from_value::<RoutingUpdate>(update) {
            Ok(update) => events.push(StreamEvent::RoutingUpdate(update)),
            Err(err) => wb_debug!("Ignoring malformed routing_update: {}", err),
        }
    }
    if let Some(trace) = fields.remove("trace_event").filter(|v| !v.is_null()) {
        events.push(StreamEvent::Trace(trace));
    }
    if fields.get("done").is_some_and(is_truthy) {
        events.push(StreamEvent::Done);
    }
    Ok(events)
}

/// JSON truthiness as the backend means it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
