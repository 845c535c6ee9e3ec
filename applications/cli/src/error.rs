/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read audio file {path}: {reason}")]
    Probe { path: String, reason: String },

    #[error("Bad argument: {0}")]
    BadArgument(String),

    #[error(transparent)]
    Cadenza(#[from] cadenza_core::CadenzaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<cadenza_playback::PlaybackError> for CliError {
    fn from(err: cadenza_playback::PlaybackError) -> Self {
        Self::Cadenza(err.into())
    }
}
