/// Core error types for Cadenza
use thiserror::Error;

/// Result type alias using `CadenzaError`
pub type Result<T> = std::result::Result<T, CadenzaError>;

/// Core error type for Cadenza
///
/// Every variant is recoverable; no operation terminates the process.
#[derive(Error, Debug)]
pub enum CadenzaError {
    /// Bad user input; nothing was mutated
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage unavailable or write rejected
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Audio device failed to load or decode
    #[error("Playback error: {0}")]
    Playback(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CadenzaError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this error came from user input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rejected user input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field is missing or blank
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Text field exceeds its character limit
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Category string outside the closed set
    #[error("Unknown category: {0}")]
    InvalidCategory(String),

    /// Payload exceeds its size limit
    #[error("{field} must be at most {max_bytes} bytes (got {actual_bytes})")]
    FileTooLarge {
        field: &'static str,
        max_bytes: u64,
        actual_bytes: u64,
    },

    /// Payload MIME type not accepted
    #[error("{field} has unsupported type {mime_type}")]
    UnsupportedMimeType {
        field: &'static str,
        mime_type: String,
    },

    /// Accent color is not a `#rrggbb` value
    #[error("Invalid accent color: {0}")]
    InvalidColor(String),

    /// Duration must be finite and non-negative
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),
}
