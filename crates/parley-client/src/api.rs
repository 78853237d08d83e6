//! Typed HTTP client for the messaging API.
//!
//! One `reqwest::Client` with a bounded timeout, bearer authentication on
//! every call, and response normalization (envelope + key casing) applied
//! before deserialization. Holds no cache; every call re-fetches.

use reqwest::multipart;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use parley_shared::config::CoreConfig;
use parley_shared::error::{ChatError, Result};
use parley_shared::types::{Attachment, ChatMessage, ChatRoom, Credential, MessageId, RoomId, UserId};

use crate::decode;

/// Client for the request/response surface of the messaging backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl ApiClient {
    /// Build a client with the configured bounded timeouts.
    pub fn new(config: &CoreConfig, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(transport_err)?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// `GET /chat` — all rooms of the current identity.
    pub async fn list_rooms(&self) -> Result<Vec<ChatRoom>> {
        let resp = self
            .http
            .get(self.url("/chat"))
            .bearer_auth(self.credential.reveal())
            .send()
            .await
            .map_err(transport_err)?;

        read_json(resp).await
    }

    /// `POST /chat/{counterpartyId}` — create a room with the counterparty.
    pub async fn create_room(&self, counterparty: &UserId) -> Result<ChatRoom> {
        let resp = self
            .http
            .post(self.url(&format!("/chat/{counterparty}")))
            .bearer_auth(self.credential.reveal())
            .send()
            .await
            .map_err(transport_err)?;

        read_json(resp).await
    }

    /// `GET /chat/messages/{roomId}` — message history for a room.
    pub async fn list_messages(&self, room: &RoomId) -> Result<Vec<ChatMessage>> {
        let resp = self
            .http
            .get(self.url(&format!("/chat/messages/{room}")))
            .bearer_auth(self.credential.reveal())
            .send()
            .await
            .map_err(transport_err)?;

        read_json(resp).await
    }

    /// `POST /chat/message/{roomId}` — send a message as a multipart body
    /// (`Content` text part plus optional `Image` file parts).
    pub async fn send_message(
        &self,
        room: &RoomId,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<ChatMessage> {
        let mut form = multipart::Form::new().text("Content", content.to_string());

        for attachment in attachments {
            let part = multipart::Part::bytes(attachment.data.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.content_type)
                .map_err(transport_err)?;
            form = form.part("Image", part);
        }

        let resp = self
            .http
            .post(self.url(&format!("/chat/message/{room}")))
            .bearer_auth(self.credential.reveal())
            .multipart(form)
            .send()
            .await
            .map_err(transport_err)?;

        read_json(resp).await
    }

    /// `DELETE /chat/{messageId}` — revoke (soft-delete) a message.
    pub async fn revoke_message(&self, message: &MessageId) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/chat/{message}")))
            .bearer_auth(self.credential.reveal())
            .send()
            .await
            .map_err(transport_err)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport_err)?;

    if !status.is_success() {
        return Err(status_error(status, body));
    }

    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))?;

    decode::decode(value)
}

fn status_error(status: StatusCode, body: String) -> ChatError {
    match status {
        StatusCode::NOT_FOUND => ChatError::NotFound,
        StatusCode::FORBIDDEN => ChatError::Forbidden,
        other => ChatError::Transport {
            status: Some(other.as_u16()),
            body,
        },
    }
}

fn transport_err(e: reqwest::Error) -> ChatError {
    ChatError::Transport {
        status: e.status().map(|s| s.as_u16()),
        body: e.to_string(),
    }
}
