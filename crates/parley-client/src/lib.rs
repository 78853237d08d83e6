pub mod api;
pub mod channel;
pub mod decode;
pub mod events;
pub mod messages;
pub mod poll;
pub mod rooms;
pub mod session;

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

pub use crate::api::ApiClient;
pub use crate::channel::{ChatChannel, Subscription};
pub use crate::messages::MessageStore;
pub use crate::poll::{spawn_poller, Poller};
pub use crate::rooms::RoomResolver;
pub use crate::session::{
    require_credential, resolve_credential, CredentialStore, EnvCredentialStore,
    MemoryCredentialStore,
};

pub use parley_shared::config::CoreConfig;
pub use parley_shared::error::{ChatError, Result};
pub use parley_shared::types::{
    Attachment, ChatMessage, ChatRoom, ConnectionState, Credential, MessageId, RoomId, UserId,
};

/// One-stop handle over the messaging core: room resolution, message
/// history, and the live presence/event channel, all sharing a single
/// resolved credential.
pub struct ChatCore {
    pub rooms: RoomResolver,
    pub messages: MessageStore,
    pub channel: ChatChannel,
}

impl ChatCore {
    /// Resolve the session credential from `store` and assemble the
    /// core. Fails with [`ChatError::IdentityMissing`] when no slot
    /// holds a credential.
    pub fn new(
        config: &CoreConfig,
        store: &dyn CredentialStore,
        local_user: UserId,
    ) -> Result<Self> {
        let credential = require_credential(store)?;

        let api = Arc::new(ApiClient::new(config, credential.clone())?);
        let channel = ChatChannel::new(config, local_user, credential);

        Ok(Self {
            rooms: RoomResolver::new(api.clone()),
            messages: MessageStore::new(api),
            channel,
        })
    }
}

/// Install the default tracing subscriber for host applications that do
/// not bring their own.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley_client=debug,parley_net=debug,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
