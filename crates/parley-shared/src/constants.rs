/// Ordered credential storage slots checked by the session identity
/// resolver. First non-empty value wins.
pub const TOKEN_SLOTS: &[&str] = &["access_token", "token"];

/// Reconnect backoff table in seconds, indexed by retry attempt.
/// Attempt 1 retries immediately; later attempts cap at the last entry.
pub const RECONNECT_DELAYS_SECS: &[u64] = &[0, 2, 5, 10, 30];

/// Retry budget for automatic reconnects. Past this the channel goes to
/// `Failed` and waits for an explicit manual retry.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Capacity of the hub command and notification channels.
pub const HUB_CHANNEL_CAPACITY: usize = 256;

/// Default bounded timeout for request/response calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default timeout for the hub websocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default hub (websocket) endpoint URL.
pub const DEFAULT_HUB_URL: &str = "ws://localhost:8080/hub";
