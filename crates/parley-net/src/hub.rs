//! Hub connection orchestration with tokio mpsc command/notification pattern.
//!
//! The hub event loop runs in a dedicated tokio task that owns the single
//! physical websocket connection. External code communicates with it through
//! typed command and notification channels; the connection state is
//! published on a watch channel. The task supervises the connection with
//! the reconnect controller: exponential backoff from a fixed table, capped
//! retries, and room-subscription replay after every successful reconnect.

use std::collections::HashSet;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use parley_shared::constants::HUB_CHANNEL_CAPACITY;
use parley_shared::types::{ChatMessage, ConnectionState, Credential, RoomId, UserId};

use crate::presence::PresenceTracker;
use crate::reconnect::{ReconnectController, RetryDecision};
use crate::wire::{ClientFrame, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// Establish the connection. Sent by the first subscriber, or as an
    /// explicit manual retry out of `Failed`.
    Connect,
    /// Tear down the connection, announcing departure if one is live.
    /// Cancels any pending scheduled retry.
    Disconnect,
    /// Announce a user as online.
    AnnounceConnected(UserId),
    /// Announce a user as going offline.
    AnnounceDisconnected(UserId),
    /// Push a message to a room over the low-latency path.
    SendMessage { room_id: RoomId, content: String },
    /// Join a room for live delivery. Remembered and replayed after
    /// every reconnect.
    JoinRoom(RoomId),
    /// Leave a previously joined room.
    LeaveRoom(RoomId),
    /// Request a snapshot of currently online users.
    GetPresence(oneshot::Sender<Vec<UserId>>),
}

/// Notifications sent *from* the hub task to the application.
#[derive(Debug, Clone)]
pub enum HubNotification {
    /// A user came online.
    UserOnline(UserId),
    /// A user went offline.
    UserOffline(UserId),
    /// Complete snapshot of online users (replaces local state).
    PresenceSnapshot(Vec<UserId>),
    /// A new message arrived in a joined room.
    NewMessage(ChatMessage),
    /// Generic application notification.
    Notification(serde_json::Value),
}

/// Configuration for spawning the hub task.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// URL of the hub websocket endpoint.
    pub hub_url: String,
    /// Identity announced on connect and re-announced after reconnects.
    pub local_user: UserId,
    /// Timeout for the websocket handshake.
    pub connect_timeout: Duration,
}

/// Spawn the hub connection task.
///
/// Returns channels for sending commands and receiving notifications,
/// plus a watch receiver for the connection state. The task starts in
/// `Disconnected` and does nothing until a `Connect` command arrives.
pub fn spawn_hub(
    config: HubConfig,
    credential: Credential,
) -> (
    mpsc::Sender<HubCommand>,
    mpsc::Receiver<HubNotification>,
    watch::Receiver<ConnectionState>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<HubCommand>(HUB_CHANNEL_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel::<HubNotification>(HUB_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

    let task = HubTask {
        config,
        credential,
        cmd_rx,
        notif_tx,
        state_tx,
        presence: PresenceTracker::new(),
        joined: HashSet::new(),
        controller: ReconnectController::new(),
    };

    tokio::spawn(task.run());

    (cmd_tx, notif_rx, state_rx)
}

// ---------------------------------------------------------------------------
// Event-loop task
// ---------------------------------------------------------------------------

/// How a live session ended.
enum SessionEnd {
    /// Explicit `Disconnect` command.
    Explicit,
    /// Transport drop (network blip, server restart, send failure).
    Dropped,
    /// All command senders were dropped.
    Shutdown,
}

/// Why a connect cycle ended.
enum CycleEnd {
    /// Back to `Disconnected` or `Failed`, keep serving commands.
    Idle,
    /// All command senders were dropped.
    Shutdown,
}

struct HubTask {
    config: HubConfig,
    credential: Credential,
    cmd_rx: mpsc::Receiver<HubCommand>,
    notif_tx: mpsc::Sender<HubNotification>,
    state_tx: watch::Sender<ConnectionState>,
    presence: PresenceTracker,
    joined: HashSet<RoomId>,
    controller: ReconnectController,
}

impl HubTask {
    async fn run(mut self) {
        loop {
            // Disconnected or Failed: nothing scheduled, wait for commands.
            match self.cmd_rx.recv().await {
                None => break,
                Some(HubCommand::Connect) => {
                    // An explicit connect always starts with a fresh
                    // retry budget, including the manual retry out of
                    // Failed.
                    self.controller.reset();
                    if let CycleEnd::Shutdown = self.connect_cycle().await {
                        break;
                    }
                }
                Some(HubCommand::Disconnect) => {
                    // Failed is only left through an explicit command:
                    // Connect restarts the cycle, Disconnect settles back
                    // to Disconnected and drops all session-scoped state.
                    if *self.state_tx.borrow() == ConnectionState::Failed {
                        self.teardown();
                        self.set_state(ConnectionState::Disconnected);
                    } else {
                        debug!("Disconnect while already disconnected, ignoring");
                    }
                }
                Some(cmd) => self.handle_offline_command(cmd),
            }
        }

        info!("Hub event loop terminated");
    }

    /// One full connection lifecycle: connect, run the session, and keep
    /// reconnecting under the retry policy until the channel is either
    /// explicitly disconnected or the budget is exhausted.
    async fn connect_cycle(&mut self) -> CycleEnd {
        self.set_state(ConnectionState::Connecting);

        loop {
            match self.try_connect().await {
                Ok(ws) => {
                    self.controller.reset();
                    self.set_state(ConnectionState::Connected);

                    match self.run_session(ws).await {
                        SessionEnd::Explicit => {
                            self.teardown();
                            self.set_state(ConnectionState::Disconnected);
                            return CycleEnd::Idle;
                        }
                        SessionEnd::Shutdown => return CycleEnd::Shutdown,
                        SessionEnd::Dropped => {
                            self.set_state(ConnectionState::Reconnecting);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Hub connect attempt failed");
                }
            }

            match self.controller.next_attempt() {
                RetryDecision::Retry(delay) => {
                    self.set_state(ConnectionState::Reconnecting);
                    debug!(delay_secs = delay.as_secs(), "Scheduling hub reconnect");
                    match self.wait_retry(delay).await {
                        RetryWait::Proceed => {}
                        RetryWait::Cancelled => {
                            self.teardown();
                            self.set_state(ConnectionState::Disconnected);
                            return CycleEnd::Idle;
                        }
                        RetryWait::Shutdown => return CycleEnd::Shutdown,
                    }
                }
                RetryDecision::GiveUp => {
                    error!(
                        attempts = self.controller.attempts(),
                        "Hub retry budget exhausted, giving up"
                    );
                    self.presence.clear();
                    self.set_state(ConnectionState::Failed);
                    return CycleEnd::Idle;
                }
            }
        }
    }

    async fn try_connect(&self) -> anyhow::Result<WsStream> {
        let url = hub_url_with_token(&self.config.hub_url, &self.credential);

        let (ws, _) = timeout(self.config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| anyhow::anyhow!("Hub handshake timed out"))??;

        Ok(ws)
    }

    /// Drive one established connection until it ends.
    async fn run_session(&mut self, mut ws: WsStream) -> SessionEnd {
        // Presence from before the reconnect is never trusted: drop it
        // now and rebuild from the snapshot the hub sends after the
        // announcement below.
        self.presence.clear();

        let announce = ClientFrame::AnnounceConnected {
            user_id: self.config.local_user.clone(),
        };
        if self.send_frame(&mut ws, &announce).await.is_err() {
            return SessionEnd::Dropped;
        }

        // Room membership is not preserved server-side across reconnects;
        // replay every room the application still has open.
        for room_id in self.joined.clone() {
            let join = ClientFrame::JoinRoom { room_id };
            if self.send_frame(&mut ws, &join).await.is_err() {
                return SessionEnd::Dropped;
            }
        }

        info!(rooms = self.joined.len(), "Hub session established");

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    None => {
                        let _ = ws.close(None).await;
                        return SessionEnd::Shutdown;
                    }
                    Some(HubCommand::Disconnect) => {
                        let bye = ClientFrame::AnnounceDisconnected {
                            user_id: self.config.local_user.clone(),
                        };
                        let _ = self.send_frame(&mut ws, &bye).await;
                        let _ = ws.close(None).await;
                        return SessionEnd::Explicit;
                    }
                    Some(HubCommand::Connect) => {
                        debug!("Connect while already connected, ignoring");
                    }
                    Some(HubCommand::AnnounceConnected(user_id)) => {
                        let frame = ClientFrame::AnnounceConnected { user_id };
                        if self.send_frame(&mut ws, &frame).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(HubCommand::AnnounceDisconnected(user_id)) => {
                        let frame = ClientFrame::AnnounceDisconnected { user_id };
                        if self.send_frame(&mut ws, &frame).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(HubCommand::SendMessage { room_id, content }) => {
                        let frame = ClientFrame::SendMessage { room_id, content };
                        if self.send_frame(&mut ws, &frame).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(HubCommand::JoinRoom(room_id)) => {
                        self.joined.insert(room_id.clone());
                        let frame = ClientFrame::JoinRoom { room_id };
                        if self.send_frame(&mut ws, &frame).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(HubCommand::LeaveRoom(room_id)) => {
                        self.joined.remove(&room_id);
                        let frame = ClientFrame::LeaveRoom { room_id };
                        if self.send_frame(&mut ws, &frame).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(HubCommand::GetPresence(reply)) => {
                        let _ = reply.send(self.presence.online_users());
                    }
                },

                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_server_frame(&text).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Hub closed the connection");
                        return SessionEnd::Dropped;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong handled by the protocol layer; binary
                        // frames are not part of the hub protocol.
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Hub transport error");
                        return SessionEnd::Dropped;
                    }
                    None => {
                        info!("Hub stream ended");
                        return SessionEnd::Dropped;
                    }
                },
            }
        }
    }

    async fn handle_server_frame(&mut self, text: &str) {
        let frame = match ServerFrame::from_text(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = text.len(), "Failed to decode hub frame");
                return;
            }
        };

        match frame {
            ServerFrame::UserOnline { user_id } => {
                self.presence.on_online(user_id.clone());
                self.notify(HubNotification::UserOnline(user_id)).await;
            }
            ServerFrame::UserOffline { user_id } => {
                self.presence.on_offline(&user_id);
                self.notify(HubNotification::UserOffline(user_id)).await;
            }
            ServerFrame::OnlineUsers { users } => {
                self.presence.apply_snapshot(users.clone());
                self.notify(HubNotification::PresenceSnapshot(users)).await;
            }
            ServerFrame::NewMessage { message } => {
                debug!(
                    room = %message.chat_room_id,
                    sender = %message.sender_id,
                    "Live message received"
                );
                self.notify(HubNotification::NewMessage(message)).await;
            }
            ServerFrame::Notification { payload } => {
                self.notify(HubNotification::Notification(payload)).await;
            }
            ServerFrame::Unknown => {
                debug!("Ignoring unknown hub frame");
            }
        }
    }

    /// Sleep out a scheduled retry while still serving commands. A
    /// `Disconnect` command cancels the pending retry.
    async fn wait_retry(&mut self, delay: Duration) -> RetryWait {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return RetryWait::Proceed,

                cmd = self.cmd_rx.recv() => match cmd {
                    None => return RetryWait::Shutdown,
                    Some(HubCommand::Disconnect) => {
                        info!("Pending reconnect cancelled by explicit disconnect");
                        return RetryWait::Cancelled;
                    }
                    Some(HubCommand::Connect) => {
                        debug!("Connect while reconnect already scheduled, ignoring");
                    }
                    Some(cmd) => self.handle_offline_command(cmd),
                },
            }
        }
    }

    /// Handle commands arriving while no connection is live.
    fn handle_offline_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::GetPresence(reply) => {
                let _ = reply.send(self.presence.online_users());
            }
            HubCommand::JoinRoom(room_id) => {
                // Queued: replayed as soon as a session is established.
                self.joined.insert(room_id);
            }
            HubCommand::LeaveRoom(room_id) => {
                self.joined.remove(&room_id);
            }
            HubCommand::SendMessage { room_id, .. } => {
                warn!(room = %room_id, "Hub not connected, dropping live send");
            }
            HubCommand::AnnounceConnected(user_id)
            | HubCommand::AnnounceDisconnected(user_id) => {
                warn!(user = %user_id, "Hub not connected, dropping announcement");
            }
            HubCommand::Connect | HubCommand::Disconnect => {
                // Handled by the callers of this function.
            }
        }
    }

    async fn send_frame(&self, ws: &mut WsStream, frame: &ClientFrame) -> anyhow::Result<()> {
        let text = frame
            .to_text()
            .map_err(|e| anyhow::anyhow!("Frame serialization error: {e}"))?;

        ws.send(Message::Text(text)).await.map_err(|e| {
            warn!(error = %e, "Hub send failed");
            anyhow::anyhow!("Hub send failed: {e}")
        })
    }

    async fn notify(&self, notification: HubNotification) {
        let _ = self.notif_tx.send(notification).await;
    }

    /// Explicit disconnect: drop presence and local room subscriptions.
    fn teardown(&mut self) {
        self.presence.clear();
        self.joined.clear();
    }

    fn set_state(&self, state: ConnectionState) {
        let prev = self.state_tx.send_replace(state);
        if prev != state {
            info!(from = ?prev, to = ?state, "Hub connection state changed");
        }
    }
}

enum RetryWait {
    /// Delay elapsed, attempt the reconnect.
    Proceed,
    /// Explicit disconnect arrived before the retry fired.
    Cancelled,
    /// All command senders were dropped.
    Shutdown,
}

/// Append the credential as an `access_token` query parameter.
fn hub_url_with_token(hub_url: &str, credential: &Credential) -> String {
    let separator = if hub_url.contains('?') { '&' } else { '?' };
    format!("{hub_url}{separator}access_token={}", credential.reveal())
}
