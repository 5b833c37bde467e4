//! Request body normalization.
//!
//! Clients have sent message-send bodies in several shapes over time: role
//! enums spelled `ROLE_USER` or `USER`, parts tagged with `type` instead of
//! `kind`, untagged `{ "text": ... }` parts, a bare string in place of the
//! message object, snake_case keys, and missing message IDs. Everything is
//! rewritten here into the single shape [`SendMessageParams`] deserializes.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::{A2aError, A2aResult};
use crate::types::SendMessageParams;

/// Turn raw `params` (JSON-RPC) or a raw body (REST) into send parameters
pub fn send_message_params(value: Value) -> A2aResult<SendMessageParams> {
    let Value::Object(mut params) = value else {
        return Err(A2aError::invalid_params("params must be a JSON object"));
    };

    let message = params
        .remove("message")
        .ok_or_else(|| A2aError::invalid_params("params.message is required"))?;
    params.insert("message".to_string(), message_value(message)?);

    serde_json::from_value(Value::Object(params))
        .map_err(|e| A2aError::invalid_params(format!("invalid message: {e}")))
}

/// Normalize one message value
pub fn message_value(value: Value) -> A2aResult<Value> {
    let mut message = match value {
        Value::String(text) => {
            let mut message = Map::new();
            message.insert("parts".to_string(), json!([text_part(text)]));
            message
        }
        Value::Object(map) => map,
        _ => return Err(A2aError::invalid_params("message must be an object or a string")),
    };

    rename_key(&mut message, "message_id", "messageId");
    rename_key(&mut message, "id", "messageId");
    rename_key(&mut message, "context_id", "contextId");
    rename_key(&mut message, "task_id", "taskId");

    let role = match message.remove("role") {
        None | Some(Value::Null) => "user",
        Some(Value::String(raw)) => role_name(&raw)
            .ok_or_else(|| A2aError::invalid_params(format!("unknown message role '{raw}'")))?,
        Some(other) => {
            return Err(A2aError::invalid_params(format!(
                "message role must be a string, got {other}"
            )));
        }
    };
    message.insert("role".to_string(), Value::String(role.to_string()));

    let has_id = matches!(message.get("messageId"), Some(Value::String(id)) if !id.is_empty());
    if !has_id {
        message.insert(
            "messageId".to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
    }

    let parts = match message.remove("parts").or_else(|| message.remove("content")) {
        Some(Value::Array(parts)) => parts
            .into_iter()
            .map(part_value)
            .collect::<A2aResult<Vec<_>>>()?,
        Some(single @ (Value::Object(_) | Value::String(_))) => vec![part_value(single)?],
        Some(other) => {
            return Err(A2aError::invalid_params(format!(
                "message parts must be an array, got {other}"
            )));
        }
        None => match message.remove("text") {
            Some(Value::String(text)) => vec![text_part(text)],
            _ => Vec::new(),
        },
    };
    message.insert("parts".to_string(), Value::Array(parts));
    message.insert("kind".to_string(), Value::String("message".to_string()));

    Ok(Value::Object(message))
}

/// Map the role spellings seen on the wire onto `user` / `agent`
fn role_name(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.strip_prefix("role_").unwrap_or(&lowered) {
        "user" => Some("user"),
        "agent" | "assistant" | "model" => Some("agent"),
        _ => None,
    }
}

fn part_value(value: Value) -> A2aResult<Value> {
    let mut part = match value {
        Value::String(text) => return Ok(text_part(text)),
        Value::Object(map) => map,
        other => {
            return Err(A2aError::invalid_params(format!(
                "message part must be an object, got {other}"
            )));
        }
    };

    let tag = part
        .remove("kind")
        .or_else(|| part.remove("type"))
        .and_then(|tag| tag.as_str().map(str::to_ascii_lowercase));
    let kind = match tag.as_deref() {
        Some("text") => "text",
        Some("data") => "data",
        Some(other) => {
            return Err(A2aError::invalid_params(format!(
                "unsupported part kind '{other}'"
            )));
        }
        None if part.contains_key("text") => "text",
        None if part.contains_key("data") => "data",
        None => return Err(A2aError::invalid_params("message part has no kind")),
    };
    part.insert("kind".to_string(), Value::String(kind.to_string()));
    Ok(Value::Object(part))
}

fn text_part(text: String) -> Value {
    json!({ "kind": "text", "text": text })
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if !map.contains_key(to)
        && let Some(value) = map.remove(from)
    {
        map.insert(to.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Part, Role};
    use rstest::rstest;

    #[rstest]
    #[case("user", Role::User)]
    #[case("USER", Role::User)]
    #[case("ROLE_USER", Role::User)]
    #[case("agent", Role::Agent)]
    #[case("ROLE_AGENT", Role::Agent)]
    #[case("assistant", Role::Agent)]
    fn test_role_dialects(#[case] raw: &str, #[case] expected: Role) {
        let params = send_message_params(json!({
            "message": {"role": raw, "parts": [{"kind": "text", "text": "hi"}], "messageId": "m-1"}
        }))
        .unwrap();
        assert_eq!(params.message.role, expected);
        assert_eq!(params.message.message_id, "m-1");
    }

    #[test]
    fn test_unknown_role_is_invalid_params() {
        let err = send_message_params(json!({
            "message": {"role": "narrator", "parts": []}
        }))
        .unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_plain_string_message() {
        let params = send_message_params(json!({"message": "Find doctors named Smith"})).unwrap();
        assert_eq!(params.message.role, Role::User);
        assert_eq!(params.message.text(), "Find doctors named Smith");
        assert!(!params.message.message_id.is_empty());
    }

    #[test]
    fn test_missing_message_id_is_generated() {
        let first = send_message_params(json!({
            "message": {"role": "user", "parts": [{"kind": "text", "text": "a"}]}
        }))
        .unwrap();
        let second = send_message_params(json!({
            "message": {"role": "user", "parts": [{"kind": "text", "text": "a"}]}
        }))
        .unwrap();
        assert_ne!(first.message.message_id, second.message.message_id);
    }

    #[test]
    fn test_type_tag_and_untagged_parts() {
        let params = send_message_params(json!({
            "message": {
                "role": "user",
                "parts": [
                    {"type": "TEXT", "text": "zip"},
                    {"text": "10001"},
                    {"data": {"zipcode": 10001}},
                    "plain"
                ]
            }
        }))
        .unwrap();
        let parts = &params.message.parts;
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].as_text(), Some("zip"));
        assert_eq!(parts[1].as_text(), Some("10001"));
        assert!(matches!(parts[2], Part::Data(_)));
        assert_eq!(parts[3].as_text(), Some("plain"));
    }

    #[test]
    fn test_snake_case_keys() {
        let params = send_message_params(json!({
            "message": {
                "role": "user",
                "message_id": "m-9",
                "context_id": "c-9",
                "task_id": "t-9",
                "content": [{"kind": "text", "text": "x"}]
            }
        }))
        .unwrap();
        assert_eq!(params.message.message_id, "m-9");
        assert_eq!(params.message.context_id.as_deref(), Some("c-9"));
        assert_eq!(params.message.task_id.as_deref(), Some("t-9"));
        assert_eq!(params.message.parts.len(), 1);
    }

    #[test]
    fn test_missing_message_is_invalid_params() {
        let err = send_message_params(json!({"text": "hello"})).unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = send_message_params(json!("hello")).unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_metadata_is_preserved() {
        let params = send_message_params(json!({
            "message": "x",
            "metadata": {"searchDoctors": {"zipcode": 10001}}
        }))
        .unwrap();
        assert_eq!(params.metadata["searchDoctors"]["zipcode"], 10001);
    }
}
