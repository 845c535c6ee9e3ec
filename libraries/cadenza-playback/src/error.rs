//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Audio device failed to load, decode or accept a command
    #[error("Audio device error: {0}")]
    Device(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

impl From<PlaybackError> for cadenza_core::CadenzaError {
    fn from(err: PlaybackError) -> Self {
        cadenza_core::CadenzaError::playback(err.to_string())
    }
}
