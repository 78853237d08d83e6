//! Response normalization at the API boundary.
//!
//! The backend is inconsistent in two ways every caller must tolerate:
//! payloads may arrive bare or wrapped in a `{ "data": ... }` envelope,
//! and object keys may use either camelCase or PascalCase (`id`/`Id`,
//! `ownerId`/`OwnerId`). Both tolerances are applied here in a single
//! pass so business logic never sees the variance.

use serde::de::DeserializeOwned;
use serde_json::Value;

use parley_shared::error::{ChatError, Result};

/// Normalize a raw response body: lower-camel every object key, then
/// unwrap a top-level `data` envelope if one is present.
pub fn normalize(value: Value) -> Value {
    let value = normalize_keys(value);

    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Normalize and deserialize into the expected shape.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(normalize(value)).map_err(|e| ChatError::Decode(e.to_string()))
}

/// Recursively rewrite PascalCase object keys to camelCase.
fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (lower_first(&key), normalize_keys(val)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn lower_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            first.to_ascii_lowercase().to_string() + chars.as_str()
        }
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use parley_shared::types::{ChatRoom, RoomId, UserId};

    #[test]
    fn test_bare_payload_passes_through() {
        let value = json!({ "id": "r1", "ownerId": "u1" });
        assert_eq!(normalize(value.clone()), value);
    }

    #[test]
    fn test_envelope_is_unwrapped() {
        let value = json!({ "data": { "id": "r1", "ownerId": "u1" } });
        assert_eq!(normalize(value), json!({ "id": "r1", "ownerId": "u1" }));
    }

    #[test]
    fn test_pascal_case_keys_normalized() {
        let value = json!({ "Id": "r1", "OwnerId": "u1" });
        assert_eq!(normalize(value), json!({ "id": "r1", "ownerId": "u1" }));
    }

    #[test]
    fn test_envelope_and_casing_combined() {
        let value = json!({ "Data": [ { "Id": "r1", "OwnerId": "u1" } ] });
        assert_eq!(
            normalize(value),
            json!([ { "id": "r1", "ownerId": "u1" } ])
        );
    }

    #[test]
    fn test_decode_into_room() {
        let value = json!({ "data": { "Id": "r1", "OwnerId": "owner-42", "UnreadCount": 3 } });
        let room: ChatRoom = decode(value).unwrap();
        assert_eq!(room.id, RoomId::new("r1"));
        assert_eq!(room.owner_id, UserId::new("owner-42"));
        assert_eq!(room.unread_count, 3);
    }

    #[test]
    fn test_decode_error_is_typed() {
        let value = json!({ "unrelated": true });
        let result: Result<ChatRoom> = decode(value);
        assert!(matches!(result, Err(ChatError::Decode(_))));
    }
}
