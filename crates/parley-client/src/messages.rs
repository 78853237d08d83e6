//! Message history and delivery over the request/response path.
//!
//! This client is the source of truth for history; the hub's push path
//! only accelerates live delivery. Reads degrade to empty sequences,
//! writes propagate their errors.

use std::sync::Arc;

use tracing::warn;

use parley_shared::error::{ChatError, Result};
use parley_shared::types::{Attachment, ChatMessage, MessageId, RoomId};

use crate::api::ApiClient;

/// Message store client for a resolved room.
pub struct MessageStore {
    api: Arc<ApiClient>,
}

impl MessageStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Message history for a room, ordered ascending by `sent_at`.
    ///
    /// An empty room is a valid state: a backend NotFound yields an empty
    /// sequence. Other failures also degrade to empty (logged, not
    /// thrown) to keep the UI usable.
    pub async fn list(&self, room: &RoomId) -> Vec<ChatMessage> {
        let mut messages = match self.api.list_messages(room).await {
            Ok(messages) => messages,
            Err(ChatError::NotFound) => Vec::new(),
            Err(e) => {
                warn!(room = %room, error = %e, "Failed to load messages, returning empty history");
                Vec::new()
            }
        };

        messages.sort_by_key(|m| m.sent_at);
        messages
    }

    /// Send a message with optional image attachments.
    ///
    /// Content must be non-empty after trimming; empty sends are rejected
    /// before any network call.
    pub async fn send(
        &self,
        room: &RoomId,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<ChatMessage> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.api.send_message(room, trimmed, &attachments).await
    }

    /// Revoke (soft-delete) a message. The backend clears the content but
    /// preserves the message's id and position.
    pub async fn revoke(&self, message: &MessageId) -> Result<()> {
        self.api.revoke_message(message).await
    }
}
