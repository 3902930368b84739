//! Required-field validation for incoming hook payloads.

use serde_json::Value;
use thiserror::Error;

use crate::event_kind::HookEvent;

/// Reasons a hook payload is rejected before any processing happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The caller asked for an event kind we don't handle.
    #[error("unknown event type: {0}")]
    UnknownEventKind(String),
    /// The payload declares a different `hook_event_name` than expected.
    #[error("event name mismatch: expected {expected}, got {}", actual.as_deref().unwrap_or("nothing"))]
    EventKindMismatch {
        expected: HookEvent,
        actual: Option<String>,
    },
    /// Required fields are absent or null.
    #[error("missing required fields for {kind}: {}", fields.join(", "))]
    MissingFields {
        kind: HookEvent,
        fields: Vec<&'static str>,
    },
}

/// Checks `record` against the required-field schema of `expected_kind`.
///
/// Returns the parsed kind on success so callers don't parse it twice.
pub fn validate(record: &Value, expected_kind: &str) -> Result<HookEvent, ValidationError> {
    let kind: HookEvent = expected_kind
        .parse()
        .map_err(|_| ValidationError::UnknownEventKind(expected_kind.to_string()))?;

    let declared = record.get("hook_event_name");
    if declared.and_then(Value::as_str) != Some(kind.as_str()) {
        return Err(ValidationError::EventKindMismatch {
            expected: kind,
            actual: declared.filter(|v| !v.is_null()).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        });
    }

    let fields: Vec<&'static str> = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|field| record.get(field).is_none_or(Value::is_null))
        .collect();
    if !fields.is_empty() {
        return Err(ValidationError::MissingFields { kind, fields });
    }

    Ok(kind)
}
