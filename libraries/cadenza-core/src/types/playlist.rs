/// Playlist domain types
use super::ids::{PlaylistId, TrackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered collection of track references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Playlist name
    pub name: String,

    /// Ordered track references
    #[serde(default)]
    pub track_ids: Vec<TrackId>,

    /// Visibility flag
    #[serde(default)]
    pub is_public: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new(name: impl Into<String>, is_public: bool) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            track_ids: Vec::new(),
            is_public,
            created_at: super::now(),
        }
    }

    /// Remove every reference to a track
    ///
    /// Returns true if anything was removed.
    pub fn remove_track(&mut self, track_id: &TrackId) -> bool {
        let before = self.track_ids.len();
        self.track_ids.retain(|id| id != track_id);
        self.track_ids.len() != before
    }
}
