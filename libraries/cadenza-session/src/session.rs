//! Session composition root
//!
//! Owns the library, the playback engine, the device event receiver and
//! the session store, and routes engine events between them.

use cadenza_core::types::TrackId;
use cadenza_core::{CadenzaError, Result};
use cadenza_library::Library;
use cadenza_playback::{DeviceEvent, PlaybackEngine, PlaybackEvent, QueueTrack};
use crossbeam_channel::Receiver;

use crate::preferences::LibraryPreferences;
use crate::store::SessionStore;

pub struct Session {
    library: Library,
    engine: PlaybackEngine,
    device_events: Receiver<DeviceEvent>,
    store: SessionStore,
    preferences: LibraryPreferences,
}

impl Session {
    /// Assemble a session and restore the last saved state
    ///
    /// The engine reloads the saved track if a queue was saved with it.
    pub async fn open(
        library: Library,
        engine: PlaybackEngine,
        device_events: Receiver<DeviceEvent>,
        store: SessionStore,
    ) -> Result<Self> {
        let preferences = store.load_library_preferences().await?;
        let state = store.load_player().await?;

        let mut session = Self {
            library,
            engine,
            device_events,
            store,
            preferences,
        };

        if let Err(e) = session.engine.restore(state) {
            tracing::warn!("Could not resume saved track: {}", e);
        }
        // Restoring re-emits the saved state; nothing new to persist
        session.engine.drain_events();

        tracing::info!(
            queue = session.engine.queue().len(),
            status = session.engine.status().as_str(),
            "Session restored"
        );
        Ok(session)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    pub fn preferences(&self) -> &LibraryPreferences {
        &self.preferences
    }

    /// Replace library preferences and persist them
    pub async fn set_preferences(&mut self, preferences: LibraryPreferences) -> Result<()> {
        self.store.save_library_preferences(&preferences).await?;
        self.preferences = preferences;
        Ok(())
    }

    /// Queue library tracks by id and start playing `ids[start]`
    ///
    /// Fails with not-found if any id is missing from the library.
    pub fn play_tracks(&mut self, ids: &[TrackId], start: usize) -> Result<()> {
        let tracks = ids
            .iter()
            .map(|id| {
                self.library
                    .get(id)
                    .map(QueueTrack::from)
                    .ok_or_else(|| CadenzaError::not_found("Track", id.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.engine.set_queue(tracks, start)?;
        Ok(())
    }

    /// Delete a track from the library, then evict it from the queue
    ///
    /// Returns false if the library had no such track.
    pub async fn delete_track(&mut self, id: &TrackId) -> Result<bool> {
        let existed = self.library.delete(id).await?;
        let evicted = self.engine.remove_track(id);
        if evicted > 0 {
            tracing::debug!(track_id = %id, evicted, "Evicted deleted track from queue");
        }
        Ok(existed)
    }

    /// Apply pending device events and route the resulting engine events
    ///
    /// Plays are counted in the library, volume changes are saved right
    /// away, and any other state change saves the full snapshot once.
    /// Returns the engine events for the caller to display.
    pub async fn pump(&mut self) -> Result<Vec<PlaybackEvent>> {
        self.engine.pump(&self.device_events);
        let events = self.engine.drain_events();
        self.route(&events).await?;
        Ok(events)
    }

    async fn route(&mut self, events: &[PlaybackEvent]) -> Result<()> {
        let mut dirty = false;
        let mut failure = None;

        for event in events {
            match event {
                PlaybackEvent::PlaybackStarted { track_id } => {
                    // The track may have been deleted since it was queued
                    if let Err(e) = self.library.increment_plays(track_id).await {
                        tracing::warn!(track_id = %track_id, "Failed to count play: {}", e);
                    }
                }
                PlaybackEvent::VolumeChanged { volume, muted } => {
                    if let Err(e) = self.store.save_volume(*volume, *muted).await {
                        tracing::warn!("Failed to save volume: {}", e);
                        failure.get_or_insert(e);
                    }
                }
                PlaybackEvent::Error { message } => {
                    tracing::warn!(error = %message, "Playback error");
                }
                other => dirty |= other.is_persistent(),
            }
        }

        if dirty {
            if let Err(e) = self.store.save_player(&self.engine.state()).await {
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Apply outstanding device events, then write one final snapshot
    pub async fn shutdown(mut self) -> Result<()> {
        self.pump().await?;

        self.store.save_player(&self.engine.state()).await?;
        self.store
            .save_library_preferences(&self.preferences)
            .await?;

        tracing::info!("Session saved");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("library", &self.library)
            .field("engine", &self.engine)
            .field("preferences", &self.preferences)
            .finish_non_exhaustive()
    }
}
