//! Room resolution: find or create the single room shared with a
//! counterparty.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use parley_shared::error::{ChatError, Result};
use parley_shared::types::{ChatRoom, UserId};

use crate::api::ApiClient;

/// Resolves the 1:1 chat room between the current user and a counterparty.
pub struct RoomResolver {
    api: Arc<ApiClient>,
}

impl RoomResolver {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Find the existing room with `counterparty`, creating one if none
    /// exists. Identifier comparison is normalized (case and whitespace
    /// insensitive).
    ///
    /// Known limitation: list-then-create is not atomic, so two
    /// concurrent resolutions for the same counterparty can race and
    /// create duplicate rooms. Deduplication requires a uniqueness
    /// constraint on the backend and is out of this core's control.
    pub async fn resolve_or_create(&self, counterparty: &UserId) -> Result<ChatRoom> {
        let rooms = self.api.list_rooms().await?;

        if let Some(room) = rooms
            .into_iter()
            .find(|room| room.owner_id.matches(counterparty))
        {
            debug!(room = %room.id, counterparty = %counterparty, "Resolved existing room");
            return Ok(room);
        }

        info!(counterparty = %counterparty, "No existing room, creating one");
        self.api.create_room(counterparty).await
    }

    /// All rooms of the current identity, for listing surfaces.
    ///
    /// Degrades to an empty list on failure so the UI stays usable;
    /// the error is logged, not thrown.
    pub async fn list_rooms(&self) -> Vec<ChatRoom> {
        match self.api.list_rooms().await {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(error = %e, "Failed to list rooms, returning empty list");
                Vec::new()
            }
        }
    }
}

/// Derive the counterparty identifier from a listing-like source object.
///
/// Accepts both `ownerId` and `OwnerId` keys. Fails with
/// `CounterpartyUnknown` carrying the raw source object so upstream data
/// inconsistencies can be debugged.
pub fn counterparty_from_listing(listing: &Value) -> Result<UserId> {
    listing
        .get("ownerId")
        .or_else(|| listing.get("OwnerId"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(UserId::new)
        .ok_or_else(|| ChatError::CounterpartyUnknown {
            context: listing.clone(),
        })
}
