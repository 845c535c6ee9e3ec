//! Storage traits for the persistence layer
//!
//! Implemented by `cadenza-storage` on SQLite and by in-memory doubles in
//! tests. Not-found is expressed as `None`, never as an error.

use crate::error::Result;
use crate::types::{Playlist, PlaylistId, Track, TrackId};
use async_trait::async_trait;
use serde_json::Value;

/// Durable track and playlist records
#[async_trait]
pub trait TrackStore: Send + Sync {
    // ========================================================================
    // Tracks
    // ========================================================================

    /// Upsert a track by id, returning the id
    async fn put_track(&self, track: &Track) -> Result<TrackId>;

    /// Get track by ID
    async fn get_track(&self, id: &TrackId) -> Result<Option<Track>>;

    /// Get all tracks, in no particular order
    async fn get_all_tracks(&self) -> Result<Vec<Track>>;

    /// Delete a track; deleting a missing id is a no-op
    async fn delete_track(&self, id: &TrackId) -> Result<()>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Upsert a playlist by id, returning the id
    async fn put_playlist(&self, playlist: &Playlist) -> Result<PlaylistId>;

    /// Get playlist by ID
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Get all playlists
    async fn get_all_playlists(&self) -> Result<Vec<Playlist>>;

    /// Delete a playlist; deleting a missing id is a no-op
    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()>;
}

/// Key-value settings with JSON values
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Get a setting value
    async fn get_setting(&self, key: &str) -> Result<Option<Value>>;

    /// Set a setting value
    async fn set_setting(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete a setting
    async fn delete_setting(&self, key: &str) -> Result<()>;

    /// Write several settings at once
    ///
    /// Implementations backed by a database should apply the batch in a
    /// single transaction.
    async fn set_settings(&self, entries: &[(String, Value)]) -> Result<()> {
        for (key, value) in entries {
            self.set_setting(key, value).await?;
        }
        Ok(())
    }
}
