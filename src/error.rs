//! Error types for the feed core.

use thiserror::Error;

/// Main error type for feed operations.
///
/// Only transport failures terminate a manager's stream. Referential gaps,
/// unknown entity kinds and pagination exhaustion are normal states and never
/// surface as errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failure whose cause could not be classified.
    #[error("Unknown feed error")]
    Unknown,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Decode(e.to_string())
    }
}

impl From<crossbeam_channel::RecvError> for FeedError {
    fn from(_: crossbeam_channel::RecvError) -> Self {
        FeedError::ChannelClosed
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
