use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier comparison tolerant of upstream encoding differences:
    /// surrounding whitespace and ASCII case are ignored.
    pub fn matches(&self, other: &UserId) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque chat room identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque message identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque bearer credential for the messaging backend.
///
/// Read on demand from the session store, never cached by the core.
/// `Debug` redacts the value so credentials cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw bearer token, for building auth headers and hub URLs.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// A 1:1 conversation context between the current user and a counterparty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: RoomId,
    /// Identifier of the counterparty.
    pub owner_id: UserId,
    #[serde(default)]
    pub participant_display_name: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A single message within a chat room.
///
/// Immutable once sent except for revocation, which clears the content but
/// preserves the id and the message's position in the ordered history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub chat_room_id: RoomId,
    pub sender_id: UserId,
    #[serde(default)]
    pub content: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub revoked: bool,
}

/// Reference to an image attachment stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub url: String,
}

/// An outbound binary attachment, sent as one part of a multipart body.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Lifecycle state of the presence/event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    /// Whether live delivery over the channel can currently be trusted.
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_matches_ignores_case_and_whitespace() {
        let a = UserId::new("Owner-42");
        let b = UserId::new("  owner-42 ");
        assert!(a.matches(&b));
        assert!(!a.matches(&UserId::new("owner-43")));
    }

    #[test]
    fn test_credential_debug_redacts() {
        let cred = Credential::new("super-secret");
        assert_eq!(format!("{:?}", cred), "Credential(***)");
    }

    #[test]
    fn test_chat_room_optional_fields_default() {
        let room: ChatRoom =
            serde_json::from_value(serde_json::json!({ "id": "r1", "ownerId": "u1" })).unwrap();
        assert_eq!(room.id, RoomId::new("r1"));
        assert!(room.last_message.is_none());
        assert_eq!(room.unread_count, 0);
    }

    #[test]
    fn test_connection_state_liveness() {
        assert!(ConnectionState::Connected.is_live());
        assert!(!ConnectionState::Reconnecting.is_live());
    }
}
