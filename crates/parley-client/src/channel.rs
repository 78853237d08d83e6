//! Subscription surface over the shared hub connection.
//!
//! One `ChatChannel` wraps one physical hub connection and fans its
//! notifications out to any number of logical subscribers. The channel
//! is an explicitly constructed, dependency-injected handle — never a
//! hidden global. Subscriptions are reference counted: registering the
//! first listener connects the hub, dropping the last one disconnects
//! it, and everything in between shares the same connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error};

use parley_net::hub::{spawn_hub, HubCommand, HubConfig, HubNotification};
use parley_shared::config::CoreConfig;
use parley_shared::error::{ChatError, Result};
use parley_shared::types::{ConnectionState, Credential, RoomId, UserId};

use crate::events::{
    NewMessagePayload, OnlineUsersPayload, UserPresencePayload, EVENT_NEW_MESSAGE,
    EVENT_NOTIFICATION, EVENT_ONLINE_USERS, EVENT_USER_OFFLINE, EVENT_USER_ONLINE,
};

type Callback = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

struct Listener {
    id: u64,
    event: String,
    callback: Callback,
}

struct ChannelInner {
    cmd_tx: mpsc::Sender<HubCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl ChannelInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Shared handle to the presence/event channel.
#[derive(Clone)]
pub struct ChatChannel {
    inner: Arc<ChannelInner>,
}

impl ChatChannel {
    /// Spawn the hub task and build the channel handle around it.
    /// The connection stays down until the first subscription.
    pub fn new(config: &CoreConfig, local_user: UserId, credential: Credential) -> Self {
        let hub_config = HubConfig {
            hub_url: config.hub_url.clone(),
            local_user,
            connect_timeout: config.connect_timeout,
        };
        let (cmd_tx, notif_rx, state_rx) = spawn_hub(hub_config, credential);
        Self::from_parts(cmd_tx, notif_rx, state_rx)
    }

    /// Build a channel over externally supplied hub endpoints. The seam
    /// used by tests to observe commands without a live hub.
    pub fn from_parts(
        cmd_tx: mpsc::Sender<HubCommand>,
        notif_rx: mpsc::Receiver<HubNotification>,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Self {
        let inner = Arc::new(ChannelInner {
            cmd_tx,
            state_rx,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        });

        tokio::spawn(bridge_loop(Arc::downgrade(&inner), notif_rx));

        Self { inner }
    }

    /// Register a callback for a named event.
    ///
    /// Dispatch is synchronous and in registration order; a panicking
    /// listener does not prevent delivery to later listeners. The first
    /// live subscription connects the hub; dropping the last one
    /// disconnects it.
    pub fn on_event<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let first = {
            let mut listeners = self.inner.listeners();
            let first = listeners.is_empty();
            listeners.push(Listener {
                id,
                event: event.to_string(),
                callback: Arc::new(callback),
            });
            first
        };

        if first {
            let _ = self.inner.cmd_tx.try_send(HubCommand::Connect);
        }

        Subscription {
            inner: self.inner.clone(),
            id,
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.state_rx.borrow()
    }

    /// Watch receiver for connection-state changes, for UI indicators.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_rx.clone()
    }

    /// Wait until the hub is live.
    ///
    /// Resolves as soon as the state reaches `Connected`; fails with
    /// [`ChatError::ConnectionFailed`] when the retry budget runs out
    /// first, and with [`ChatError::ChannelClosed`] if the hub task is
    /// gone.
    pub async fn wait_connected(&self) -> Result<()> {
        let mut state_rx = self.inner.state_rx.clone();
        let state = state_rx
            .wait_for(|s| matches!(s, ConnectionState::Connected | ConnectionState::Failed))
            .await
            .map_err(|_| ChatError::ChannelClosed)?;

        match *state {
            ConnectionState::Connected => Ok(()),
            _ => Err(ChatError::ConnectionFailed {
                attempts: parley_shared::constants::MAX_RECONNECT_ATTEMPTS,
            }),
        }
    }

    /// Snapshot of currently online users.
    pub async fn presence(&self) -> Result<Vec<UserId>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send_cmd(HubCommand::GetPresence(reply_tx)).await?;
        reply_rx.await.map_err(|_| ChatError::ChannelClosed)
    }

    /// Explicit manual reconnect, the only way out of `Failed`.
    pub async fn retry(&self) -> Result<()> {
        self.send_cmd(HubCommand::Connect).await
    }

    /// Explicit disconnect, regardless of remaining subscriptions.
    pub async fn disconnect(&self) -> Result<()> {
        self.send_cmd(HubCommand::Disconnect).await
    }

    /// Announce a user as online.
    pub async fn announce_connected(&self, user: UserId) -> Result<()> {
        self.send_cmd(HubCommand::AnnounceConnected(user)).await
    }

    /// Announce a user as going offline.
    pub async fn announce_disconnected(&self, user: UserId) -> Result<()> {
        self.send_cmd(HubCommand::AnnounceDisconnected(user)).await
    }

    /// Push a message over the low-latency path. History remains owned
    /// by the request/response client.
    pub async fn send_live(&self, room: RoomId, content: impl Into<String>) -> Result<()> {
        self.send_cmd(HubCommand::SendMessage {
            room_id: room,
            content: content.into(),
        })
        .await
    }

    /// Join a room for live delivery; replayed automatically after
    /// reconnects.
    pub async fn join_room(&self, room: RoomId) -> Result<()> {
        self.send_cmd(HubCommand::JoinRoom(room)).await
    }

    /// Leave a previously joined room.
    pub async fn leave_room(&self, room: RoomId) -> Result<()> {
        self.send_cmd(HubCommand::LeaveRoom(room)).await
    }

    async fn send_cmd(&self, cmd: HubCommand) -> Result<()> {
        self.inner
            .cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ChatError::ChannelClosed)
    }
}

/// Live subscription to the channel. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the listener; when the last
/// subscription goes, the hub is disconnected.
pub struct Subscription {
    inner: Arc<ChannelInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let now_empty = {
            let mut listeners = self.inner.listeners();
            listeners.retain(|listener| listener.id != self.id);
            listeners.is_empty()
        };

        if now_empty {
            debug!("Last subscription dropped, disconnecting hub");
            let _ = self.inner.cmd_tx.try_send(HubCommand::Disconnect);
        }
    }
}

/// Forward hub notifications to registered listeners. Ends when either
/// the hub task or every channel handle is gone.
async fn bridge_loop(inner: Weak<ChannelInner>, mut notif_rx: mpsc::Receiver<HubNotification>) {
    while let Some(notification) = notif_rx.recv().await {
        let Some(inner) = inner.upgrade() else { break };

        let (event, payload) = match notification {
            HubNotification::UserOnline(user) => (
                EVENT_USER_ONLINE,
                serde_json::to_value(UserPresencePayload { user_id: user.0 }),
            ),
            HubNotification::UserOffline(user) => (
                EVENT_USER_OFFLINE,
                serde_json::to_value(UserPresencePayload { user_id: user.0 }),
            ),
            HubNotification::PresenceSnapshot(users) => (
                EVENT_ONLINE_USERS,
                serde_json::to_value(OnlineUsersPayload {
                    users: users.into_iter().map(|u| u.0).collect(),
                }),
            ),
            HubNotification::NewMessage(message) => (
                EVENT_NEW_MESSAGE,
                serde_json::to_value(NewMessagePayload { message }),
            ),
            HubNotification::Notification(payload) => (EVENT_NOTIFICATION, Ok(payload)),
        };

        match payload {
            Ok(value) => dispatch(&inner, event, &value),
            Err(e) => error!(event, error = %e, "Failed to serialize event payload"),
        }
    }

    debug!("Hub notification bridge ended");
}

fn dispatch(inner: &ChannelInner, event: &str, payload: &serde_json::Value) {
    // Snapshot under the lock, invoke outside it, so listeners can
    // register or unsubscribe from within a callback.
    let callbacks: Vec<Callback> = inner
        .listeners()
        .iter()
        .filter(|listener| listener.event == event)
        .map(|listener| listener.callback.clone())
        .collect();

    for callback in callbacks {
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(payload)));
        if outcome.is_err() {
            error!(event, "Event listener panicked, continuing with remaining listeners");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_channel() -> (ChatChannel, mpsc::Receiver<HubCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (_notif_tx, notif_rx) = mpsc::channel(16);
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        // Keep the notification sender alive for the test's duration
        std::mem::forget(_notif_tx);
        (ChatChannel::from_parts(cmd_tx, notif_rx, state_rx), cmd_rx)
    }

    #[tokio::test]
    async fn test_first_subscription_connects_last_drop_disconnects() {
        let (channel, mut cmd_rx) = test_channel();

        let sub_a = channel.on_event(EVENT_NEW_MESSAGE, |_| {});
        assert!(matches!(cmd_rx.recv().await, Some(HubCommand::Connect)));

        let sub_b = channel.on_event(EVENT_USER_ONLINE, |_| {});

        // Dropping one of two subscriptions must not disconnect
        drop(sub_a);
        assert!(cmd_rx.try_recv().is_err());

        drop(sub_b);
        assert!(matches!(cmd_rx.recv().await, Some(HubCommand::Disconnect)));
    }

    #[tokio::test]
    async fn test_dispatch_order_and_panic_isolation() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(16);
        let (notif_tx, notif_rx) = mpsc::channel(16);
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let channel = ChatChannel::from_parts(cmd_tx, notif_rx, state_rx);

        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _sub_a = channel.on_event(EVENT_USER_ONLINE, move |_| {
            order_a.lock().unwrap().push("a");
        });
        let _sub_b = channel.on_event(EVENT_USER_ONLINE, move |_| {
            panic!("listener failure");
        });
        let order_c = order.clone();
        let _sub_c = channel.on_event(EVENT_USER_ONLINE, move |_| {
            order_c.lock().unwrap().push("c");
        });

        notif_tx
            .send(HubNotification::UserOnline(UserId::new("u1")))
            .await
            .unwrap();

        // Give the bridge task a moment to deliver
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*order.lock().unwrap(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_wait_connected_errors_when_budget_exhausted() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(16);
        let (_notif_tx, notif_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let channel = ChatChannel::from_parts(cmd_tx, notif_rx, state_rx);

        let waiter = tokio::spawn({
            let channel = channel.clone();
            async move { channel.wait_connected().await }
        });

        state_tx.send_replace(ConnectionState::Reconnecting);
        state_tx.send_replace(ConnectionState::Failed);

        assert!(matches!(
            waiter.await.unwrap(),
            Err(ChatError::ConnectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_events_filtered_by_name() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(16);
        let (notif_tx, notif_rx) = mpsc::channel(16);
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let channel = ChatChannel::from_parts(cmd_tx, notif_rx, state_rx);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = channel.on_event(EVENT_USER_OFFLINE, move |payload| {
            seen_clone.lock().unwrap().push(payload.clone());
        });

        notif_tx
            .send(HubNotification::UserOnline(UserId::new("u1")))
            .await
            .unwrap();
        notif_tx
            .send(HubNotification::UserOffline(UserId::new("u2")))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["userId"], "u2");
    }
}
