// Presence/event channel layer: one background task owning the hub
// websocket, driven through typed command and notification channels.

pub mod hub;
pub mod presence;
pub mod reconnect;
pub mod wire;

pub use hub::{spawn_hub, HubCommand, HubConfig, HubNotification};
pub use presence::PresenceTracker;
pub use reconnect::{ReconnectController, RetryDecision};
pub use wire::{ClientFrame, ServerFrame};
