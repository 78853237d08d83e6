// Shared domain types, errors, and configuration for the messaging core.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::CoreConfig;
pub use error::{ChatError, Result};
pub use types::{
    Attachment, AttachmentRef, ChatMessage, ChatRoom, ConnectionState, Credential, MessageId,
    RoomId, UserId,
};
