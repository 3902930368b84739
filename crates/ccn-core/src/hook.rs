//! Typed hook payloads, decoded after validation.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::event_kind::HookEvent;

/// Payload of a `UserPromptSubmit` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptSubmit {
    #[serde(deserialize_with = "scalar_string")]
    pub session_id: String,
    #[serde(deserialize_with = "scalar_string")]
    pub prompt: String,
    pub cwd: String,
}

/// Payload of a `Stop` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stop {
    #[serde(deserialize_with = "scalar_string")]
    pub session_id: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Payload of a `Notification` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "scalar_string")]
    pub session_id: String,
    #[serde(deserialize_with = "scalar_string")]
    pub message: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

/// A validated hook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookPayload {
    UserPromptSubmit(PromptSubmit),
    Stop(Stop),
    Notification(Notification),
}

impl HookPayload {
    /// Decodes `record` as the payload for `kind`.
    ///
    /// Run [`crate::validate`] first; this only reports type errors.
    pub fn decode(kind: HookEvent, record: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            HookEvent::UserPromptSubmit => Self::UserPromptSubmit(serde_json::from_value(record)?),
            HookEvent::Stop => Self::Stop(serde_json::from_value(record)?),
            HookEvent::Notification => Self::Notification(serde_json::from_value(record)?),
        })
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::UserPromptSubmit(p) => &p.session_id,
            Self::Stop(p) => &p.session_id,
            Self::Notification(p) => &p.session_id,
        }
    }
}

/// Reads a string field, also taking a number or bool in its text form.
///
/// Hook runners are not strict about identifier types; the ledger stores text.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

/// Picks an alert title from a working directory: its last component, or
/// `fallback` when there is none.
pub fn title_for_cwd<'a>(cwd: Option<&'a str>, fallback: &'a str) -> &'a str {
    cwd.filter(|cwd| !cwd.is_empty())
        .and_then(|cwd| Path::new(cwd).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn decodes_prompt_submit() {
        let record = json!({
            "session_id": "s1",
            "prompt": "fix the build",
            "cwd": "/work/repo",
            "hook_event_name": "UserPromptSubmit",
            "transcript_path": "/tmp/x.jsonl",
        });
        let payload = HookPayload::decode(HookEvent::UserPromptSubmit, record).unwrap();
        assert_eq!(
            payload,
            HookPayload::UserPromptSubmit(PromptSubmit {
                session_id: "s1".into(),
                prompt: "fix the build".into(),
                cwd: "/work/repo".into(),
            })
        );
        assert_eq!(payload.session_id(), "s1");
    }

    #[test]
    fn stop_cwd_is_optional() {
        let record = json!({"session_id": "s1", "hook_event_name": "Stop"});
        let HookPayload::Stop(stop) = HookPayload::decode(HookEvent::Stop, record).unwrap() else {
            panic!("expected stop payload");
        };
        assert_eq!(stop.cwd, None);
    }

    #[test]
    fn numeric_session_id_is_kept_as_text() {
        let record = json!({"session_id": 7, "message": "hi", "hook_event_name": "Notification"});
        let payload = HookPayload::decode(HookEvent::Notification, record).unwrap();
        assert_eq!(payload.session_id(), "7");
    }

    #[test]
    fn structured_field_is_an_error() {
        let record = json!({"session_id": "s1", "message": {"text": "hi"}, "hook_event_name": "Notification"});
        assert!(HookPayload::decode(HookEvent::Notification, record).is_err());
    }

    #[test]
    fn title_uses_last_path_component() {
        assert_eq!(title_for_cwd(Some("/work/my-repo"), "Claude Task"), "my-repo");
        assert_eq!(title_for_cwd(Some("/work/my-repo/"), "Claude Task"), "my-repo");
    }

    #[test]
    fn title_falls_back_without_cwd() {
        assert_eq!(title_for_cwd(None, "Claude Task"), "Claude Task");
        assert_eq!(title_for_cwd(Some(""), "Claude Task"), "Claude Task");
        assert_eq!(title_for_cwd(Some("/"), "Claude Task"), "Claude Task");
    }
}
