//! Domain-level error taxonomy for Slipway.

/// Slipway domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SlipwayError {
    #[error("token acquisition failed for account {account}: {reason}")]
    Token { account: String, reason: String },

    #[error("CI service error: {0}")]
    CiService(String),

    #[error("release service error: {0}")]
    ReleaseService(String),

    #[error("channel store error: {0}")]
    ChannelStore(String),

    #[error("actor runtime error: {0}")]
    ActorRuntime(String),

    #[error("background work queue is closed")]
    QueueClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Slipway domain operations.
pub type Result<T> = std::result::Result<T, SlipwayError>;
