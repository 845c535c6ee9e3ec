//! Playlist operations on the library index

use cadenza_core::types::{Playlist, PlaylistId, TrackId};
use cadenza_core::validation;
use cadenza_core::{CadenzaError, Result};

use crate::index::Library;

impl Library {
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlist(&self, id: &PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| &p.id == id)
    }

    /// # Errors
    ///
    /// Returns a validation error for a bad name or the store error
    pub async fn create_playlist(&mut self, name: &str, is_public: bool) -> Result<Playlist> {
        validation::validate_playlist_name(name)?;
        let playlist = Playlist::new(name.trim(), is_public);

        self.store.put_playlist(&playlist).await?;
        self.playlists.push(playlist.clone());
        self.changed();
        Ok(playlist)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or the store error
    pub async fn rename_playlist(&mut self, id: &PlaylistId, name: &str) -> Result<Playlist> {
        validation::validate_playlist_name(name)?;
        self.edit_playlist(id, |p| {
            p.name = name.trim().to_string();
        })
        .await
    }

    /// Append a track reference
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown playlist or track, or the store error
    pub async fn add_to_playlist(
        &mut self,
        id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<Playlist> {
        if self.get(track_id).is_none() {
            return Err(CadenzaError::not_found("Track", track_id.as_str()));
        }
        let track_id = track_id.clone();
        self.edit_playlist(id, move |p| p.track_ids.push(track_id))
            .await
    }

    /// Remove every reference to a track
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown playlist or the store error
    pub async fn remove_from_playlist(
        &mut self,
        id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<Playlist> {
        self.edit_playlist(id, |p| {
            p.remove_track(track_id);
        })
        .await
    }

    /// Delete a playlist; unknown ids are a no-op
    ///
    /// # Errors
    ///
    /// Returns the store error
    pub async fn delete_playlist(&mut self, id: &PlaylistId) -> Result<bool> {
        self.store.delete_playlist(id).await?;

        let before = self.playlists.len();
        self.playlists.retain(|p| &p.id != id);
        let removed = self.playlists.len() != before;
        if removed {
            self.changed();
        }
        Ok(removed)
    }

    /// Remove a deleted track from every playlist
    ///
    /// Best effort: a playlist that cannot be written keeps the stale id
    /// and is logged.
    pub(crate) async fn strip_from_playlists(&mut self, track_id: &TrackId) {
        let affected: Vec<PlaylistId> = self
            .playlists
            .iter()
            .filter(|p| p.track_ids.contains(track_id))
            .map(|p| p.id.clone())
            .collect();

        for id in affected {
            if let Err(e) = self.remove_from_playlist(&id, track_id).await {
                tracing::warn!(
                    playlist_id = %id,
                    track_id = %track_id,
                    error = %e,
                    "Failed to strip deleted track from playlist"
                );
            }
        }
    }

    async fn edit_playlist<F>(&mut self, id: &PlaylistId, apply: F) -> Result<Playlist>
    where
        F: FnOnce(&mut Playlist),
    {
        let index = self
            .playlists
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CadenzaError::not_found("Playlist", id.as_str()))?;

        let mut edited = self.playlists[index].clone();
        apply(&mut edited);

        self.store.put_playlist(&edited).await?;
        self.playlists[index] = edited.clone();
        self.changed();
        Ok(edited)
    }
}
