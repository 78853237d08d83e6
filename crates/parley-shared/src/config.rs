//! Core configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the core can run with zero
//! configuration for local development.

use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HUB_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Messaging core configuration.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the HTTP messaging API.
    /// Env: `PARLEY_API_URL`
    /// Default: `http://localhost:8080/api`
    pub api_url: String,

    /// URL of the hub (websocket) endpoint.
    /// Env: `PARLEY_HUB_URL`
    /// Default: `ws://localhost:8080/hub`
    pub hub_url: String,

    /// Bounded timeout for every request/response call.
    /// Env: `PARLEY_REQUEST_TIMEOUT_SECS`
    /// Default: 15s
    pub request_timeout: Duration,

    /// Timeout for the hub websocket handshake.
    /// Env: `PARLEY_CONNECT_TIMEOUT_SECS`
    /// Default: 10s
    pub connect_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PARLEY_API_URL") {
            if !url.is_empty() {
                config.api_url = url;
            }
        }

        if let Ok(url) = std::env::var("PARLEY_HUB_URL") {
            if !url.is_empty() {
                config.hub_url = url;
            }
        }

        if let Ok(val) = std::env::var("PARLEY_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid PARLEY_REQUEST_TIMEOUT_SECS, using default"
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("PARLEY_CONNECT_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.connect_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid PARLEY_CONNECT_TIMEOUT_SECS, using default"
                    );
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
