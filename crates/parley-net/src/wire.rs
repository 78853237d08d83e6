use serde::{Deserialize, Serialize};

use parley_shared::types::{ChatMessage, RoomId, UserId};

/// Frames sent from the client to the hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Announce the user as online.
    #[serde(rename_all = "camelCase")]
    AnnounceConnected { user_id: UserId },

    /// Announce the user as going offline.
    #[serde(rename_all = "camelCase")]
    AnnounceDisconnected { user_id: UserId },

    /// Low-latency push of a message to a room (distinct from the
    /// request/response send path, which remains the source of truth).
    #[serde(rename_all = "camelCase")]
    SendMessage { room_id: RoomId, content: String },

    /// Join a room so the hub relays its live messages to us.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: RoomId },

    /// Leave a previously joined room.
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },
}

/// Frames pushed from the hub to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// A user came online.
    #[serde(rename_all = "camelCase")]
    UserOnline { user_id: UserId },

    /// A user went offline.
    #[serde(rename_all = "camelCase")]
    UserOffline { user_id: UserId },

    /// Complete snapshot of currently online users. Replaces, never
    /// merges with, local presence state.
    #[serde(rename_all = "camelCase")]
    OnlineUsers { users: Vec<UserId> },

    /// A new message was delivered to a joined room.
    #[serde(rename_all = "camelCase")]
    NewMessage { message: ChatMessage },

    /// Generic application notification.
    #[serde(rename_all = "camelCase")]
    Notification { payload: serde_json::Value },

    /// Frame types this client version does not understand.
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Serialize to a websocket text frame body.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerFrame {
    /// Deserialize from a websocket text frame body.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_shared::types::{MessageId, RoomId, UserId};

    #[test]
    fn test_client_frame_tags() {
        let frame = ClientFrame::JoinRoom {
            room_id: RoomId::new("r1"),
        };
        let text = frame.to_text().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "join-room");
        assert_eq!(value["roomId"], "r1");
    }

    #[test]
    fn test_server_frame_roundtrip() {
        let frame = ServerFrame::NewMessage {
            message: ChatMessage {
                id: MessageId::new("m1"),
                chat_room_id: RoomId::new("r1"),
                sender_id: UserId::new("u1"),
                content: "hello".to_string(),
                sent_at: Utc::now(),
                attachments: Vec::new(),
                revoked: false,
            },
        };

        let text = serde_json::to_string(&frame).unwrap();
        let restored = ServerFrame::from_text(&text).unwrap();

        if let ServerFrame::NewMessage { message } = restored {
            assert_eq!(message.id, MessageId::new("m1"));
            assert_eq!(message.content, "hello");
        } else {
            panic!("Frame type mismatch");
        }
    }

    #[test]
    fn test_snapshot_frame_shape() {
        let frame = ServerFrame::from_text(
            r#"{"type":"online-users","users":["u1","u2"]}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            ServerFrame::OnlineUsers {
                users: vec![UserId::new("u1"), UserId::new("u2")]
            }
        );
    }

    #[test]
    fn test_unknown_frame_tolerated() {
        let frame = ServerFrame::from_text(r#"{"type":"server-restarting"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Unknown);
    }
}
