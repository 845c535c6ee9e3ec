//! Live projection over the track store
//!
//! Mutations apply to the projection, await the store, and restore the
//! previous projection if the store rejects the write. The revision only
//! advances once the store has confirmed, so observers never see a
//! projection that later rolls back.

use cadenza_core::storage::TrackStore;
use cadenza_core::types::{NewTrack, Playlist, Track, TrackId, TrackUpdate};
use cadenza_core::validation;
use cadenza_core::{CadenzaError, Result};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

use crate::query::{filter_sort, SortKey, SortOrder, TrackFilter};
use crate::stats::LibraryStats;

/// In-memory library index
pub struct Library {
    pub(crate) store: Arc<dyn TrackStore>,
    pub(crate) tracks: Vec<Track>,
    pub(crate) playlists: Vec<Playlist>,
    revision: watch::Sender<u64>,
    stats: OnceLock<LibraryStats>,
}

impl Library {
    /// Load the projection from the store
    ///
    /// Tracks are ordered by `added_at`; equal timestamps keep store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub async fn open(store: Arc<dyn TrackStore>) -> Result<Self> {
        let mut tracks = store.get_all_tracks().await?;
        tracks.sort_by(|a, b| a.added_at.cmp(&b.added_at));
        let playlists = store.get_all_playlists().await?;

        tracing::info!(
            tracks = tracks.len(),
            playlists = playlists.len(),
            "Loaded library"
        );

        let (revision, _) = watch::channel(0);
        Ok(Self {
            store,
            tracks,
            playlists,
            revision,
            stats: OnceLock::new(),
        })
    }

    /// Current projection, in projection order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Revision counter, bumped after every confirmed change
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Observe revision changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn filtered_sorted(
        &self,
        filter: &TrackFilter,
        key: SortKey,
        order: SortOrder,
    ) -> Vec<&Track> {
        filter_sort(&self.tracks, filter, key, order)
    }

    /// Aggregate stats, computed on first read after a change
    pub fn stats(&self) -> &LibraryStats {
        self.stats.get_or_init(|| LibraryStats::compute(&self.tracks))
    }

    /// Validate and add a new track
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing mutated) or the store error
    /// (projection rolled back)
    pub async fn create(&mut self, draft: NewTrack) -> Result<Track> {
        let track = Track::create(draft)?;

        self.tracks.push(track.clone());
        if let Err(e) = self.store.put_track(&track).await {
            self.tracks.pop();
            tracing::warn!(track_id = %track.id, error = %e, "Create rolled back");
            return Err(e);
        }

        tracing::debug!(track_id = %track.id, title = %track.title, "Created track");
        self.changed();
        Ok(track)
    }

    /// Apply a metadata edit
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, a validation error, or the
    /// store error (projection rolled back)
    pub async fn update(&mut self, id: &TrackId, update: TrackUpdate) -> Result<Track> {
        validation::validate_update(&update)?;
        let index = self.position(id)?;

        let mut edited = self.tracks[index].clone();
        edited.apply_update(&update);
        self.replace(index, edited).await
    }

    /// Delete a track and strip it from every playlist
    ///
    /// Returns false if the id was not in the library.
    ///
    /// # Errors
    ///
    /// Returns the store error if the track record could not be deleted; the
    /// projection is rolled back. Once the record is gone the delete
    /// succeeds even if a playlist could not be updated.
    pub async fn delete(&mut self, id: &TrackId) -> Result<bool> {
        let Some(index) = self.tracks.iter().position(|t| &t.id == id) else {
            self.store.delete_track(id).await?;
            return Ok(false);
        };

        let removed = self.tracks.remove(index);
        if let Err(e) = self.store.delete_track(id).await {
            self.tracks.insert(index, removed);
            tracing::warn!(track_id = %id, error = %e, "Delete rolled back");
            return Err(e);
        }
        self.changed();
        tracing::debug!(track_id = %id, "Deleted track");

        self.strip_from_playlists(id).await;
        Ok(true)
    }

    /// Count one play
    ///
    /// Reads the stored record so a concurrent writer's count is not
    /// discarded; concurrent increments are last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or the store error
    pub async fn increment_plays(&mut self, id: &TrackId) -> Result<u64> {
        let track = self
            .read_modify_write(id, |t| t.plays = t.plays.saturating_add(1))
            .await?;
        Ok(track.plays)
    }

    /// Add one like
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or the store error
    pub async fn like(&mut self, id: &TrackId) -> Result<u64> {
        let track = self
            .read_modify_write(id, |t| t.likes = t.likes.saturating_add(1))
            .await?;
        Ok(track.likes)
    }

    /// Zero the play and like counters
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or the store error
    pub async fn reset_engagement(&mut self, id: &TrackId) -> Result<()> {
        self.read_modify_write(id, |t| {
            t.plays = 0;
            t.likes = 0;
        })
        .await?;
        Ok(())
    }

    async fn read_modify_write<F>(&mut self, id: &TrackId, apply: F) -> Result<Track>
    where
        F: FnOnce(&mut Track),
    {
        let index = self.position(id)?;
        let mut track = match self.store.get_track(id).await? {
            Some(stored) => stored,
            None => self.tracks[index].clone(),
        };
        apply(&mut track);
        self.replace(index, track).await
    }

    async fn replace(&mut self, index: usize, track: Track) -> Result<Track> {
        let previous = std::mem::replace(&mut self.tracks[index], track.clone());
        if let Err(e) = self.store.put_track(&track).await {
            self.tracks[index] = previous;
            tracing::warn!(track_id = %track.id, error = %e, "Update rolled back");
            return Err(e);
        }
        self.changed();
        Ok(track)
    }

    fn position(&self, id: &TrackId) -> Result<usize> {
        self.tracks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| CadenzaError::not_found("Track", id.as_str()))
    }

    /// Invalidate derived views and notify observers
    pub(crate) fn changed(&mut self) {
        self.stats.take();
        self.revision.send_modify(|r| *r += 1);
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("tracks", &self.tracks.len())
            .field("playlists", &self.playlists.len())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
