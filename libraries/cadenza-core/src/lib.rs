//! Cadenza Core
//!
//! Platform-agnostic domain types, validation policy, traits, and error
//! handling shared by every Cadenza crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `Category`, `MediaRef`
//! - **Validation**: field and payload limits enforced by the library layer
//! - **Storage Traits**: `TrackStore` and `PreferenceStore`, implemented by
//!   `cadenza-storage` and by in-memory doubles in tests
//! - **Error Handling**: unified `CadenzaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::types::{Category, MediaRef, NewTrack, Track};
//!
//! let draft = NewTrack {
//!     title: "Morning".to_string(),
//!     artist: "Field Notes".to_string(),
//!     description: None,
//!     category: Category::Ambient,
//!     duration_seconds: 212.0,
//!     audio: Some(MediaRef::new("file:///music/morning.mp3", 4_200_000, "audio/mpeg")),
//!     cover: None,
//!     accent_color: None,
//! };
//!
//! cadenza_core::validation::validate_new_track(&draft).unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod transfer;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use error::{CadenzaError, Result, ValidationError};
pub use storage::{PreferenceStore, TrackStore};
pub use transfer::{ExportSnapshot, ImportFailure, ImportReport, EXPORT_FORMAT_VERSION};
pub use types::{
    Category, MediaRef, NewTrack, Playlist, PlaylistId, Track, TrackId, TrackUpdate,
};
