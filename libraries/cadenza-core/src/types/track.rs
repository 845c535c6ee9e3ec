//! Track domain types

use super::ids::TrackId;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of track categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pop,
    Rock,
    HipHop,
    Jazz,
    Classical,
    Electronic,
    Ambient,
    Acoustic,
    Other,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 9] = [
        Category::Pop,
        Category::Rock,
        Category::HipHop,
        Category::Jazz,
        Category::Classical,
        Category::Electronic,
        Category::Ambient,
        Category::Acoustic,
        Category::Other,
    ];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pop => "pop",
            Self::Rock => "rock",
            Self::HipHop => "hiphop",
            Self::Jazz => "jazz",
            Self::Classical => "classical",
            Self::Electronic => "electronic",
            Self::Ambient => "ambient",
            Self::Acoustic => "acoustic",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

/// Reference to a stored binary payload (audio or cover image)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Location the playback device can open (path or URI)
    pub uri: String,

    /// Payload size in bytes
    pub size_bytes: u64,

    /// Payload MIME type, e.g. `audio/mpeg`
    pub mime_type: String,
}

impl MediaRef {
    pub fn new(uri: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// A single audio item with metadata and engagement counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    /// Derived from the audio payload, never user-supplied
    pub duration_seconds: f64,
    pub added_at: DateTime<Utc>,
    pub audio: MediaRef,
    #[serde(default)]
    pub cover: Option<MediaRef>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub likes: u64,
}

impl Track {
    /// Validated construction
    ///
    /// Assigns a fresh id and the current timestamp; engagement counters
    /// start at zero.
    pub fn create(draft: NewTrack) -> Result<Self, ValidationError> {
        crate::validation::validate_new_track(&draft)?;

        let NewTrack {
            title,
            artist,
            description,
            category,
            duration_seconds,
            audio,
            cover,
            accent_color,
        } = draft;

        let audio = audio.ok_or(ValidationError::Required {
            field: "audio file",
        })?;

        Ok(Self {
            id: TrackId::generate(),
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
            description: normalize_optional(description),
            category,
            duration_seconds,
            added_at: super::now(),
            audio,
            cover,
            accent_color,
            plays: 0,
            likes: 0,
        })
    }

    /// Apply a metadata edit in place
    ///
    /// Identity, payload and engagement fields are never touched here.
    pub fn apply_update(&mut self, update: &TrackUpdate) {
        if let Some(ref title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(ref artist) = update.artist {
            self.artist = artist.trim().to_string();
        }
        if let Some(ref description) = update.description {
            self.description = normalize_optional(description.clone());
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(ref cover) = update.cover {
            self.cover = cover.clone();
        }
        if let Some(ref accent_color) = update.accent_color {
            self.accent_color = accent_color.clone();
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Data for creating a new track
///
/// `duration_seconds` comes from probing the audio payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub description: Option<String>,
    pub category: Category,
    pub duration_seconds: f64,
    pub audio: Option<MediaRef>,
    pub cover: Option<MediaRef>,
    pub accent_color: Option<String>,
}

/// Metadata edit (all fields optional)
///
/// Nested options distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Category>,
    pub cover: Option<Option<MediaRef>>,
    pub accent_color: Option<Option<String>>,
}
