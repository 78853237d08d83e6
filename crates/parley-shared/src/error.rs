use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Error taxonomy for the messaging core.
///
/// Reads of rooms/messages degrade to empty sequences at the call surface;
/// everything else propagates to the caller.
#[derive(Error, Debug)]
pub enum ChatError {
    /// No session credential could be resolved. Recovered by sending the
    /// user to login, never by retrying.
    #[error("No session credential available")]
    IdentityMissing,

    /// The counterparty identifier could not be derived from the calling
    /// context. Carries the raw source object for upstream debugging.
    #[error("Cannot derive counterparty from calling context: {context}")]
    CounterpartyUnknown { context: serde_json::Value },

    /// Message content was empty after trimming. Rejected before any
    /// network call.
    #[error("Message content is empty")]
    EmptyMessage,

    /// Non-success HTTP response, channel send failure, or timeout.
    #[error("Transport error (status {status:?}): {body}")]
    Transport { status: Option<u16>, body: String },

    /// Room or message absent. A valid empty state for reads, an error
    /// for writes.
    #[error("Not found")]
    NotFound,

    /// Authorization failure. Surfaced, not retried.
    #[error("Forbidden")]
    Forbidden,

    /// The channel exhausted its retry budget. Only an explicit manual
    /// retry leaves this state.
    #[error("Connection failed after {attempts} reconnect attempts")]
    ConnectionFailed { attempts: u32 },

    /// A response body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The hub task is gone and can no longer accept commands.
    #[error("Channel closed")]
    ChannelClosed,
}
