use serde::Serialize;

use parley_shared::types::ChatMessage;

pub const EVENT_USER_ONLINE: &str = "user-online";
pub const EVENT_USER_OFFLINE: &str = "user-offline";
pub const EVENT_ONLINE_USERS: &str = "online-users";
pub const EVENT_NEW_MESSAGE: &str = "new-message";
pub const EVENT_NOTIFICATION: &str = "notification";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresencePayload {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersPayload {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub message: ChatMessage,
}
