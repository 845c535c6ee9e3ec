//! Session snapshots over the preference store
//!
//! Player state is written as one batch of keys. Reading decodes every key
//! on its own: a missing or malformed key falls back to its default with a
//! warning and never spoils the rest of the snapshot.

use cadenza_core::storage::PreferenceStore;
use cadenza_core::Result;
use cadenza_playback::types::secs_to_duration;
use cadenza_playback::{PlaybackStatus, PlayerState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::keys;
use crate::preferences::LibraryPreferences;

/// Reads and writes session state
#[derive(Clone)]
pub struct SessionStore {
    prefs: Arc<dyn PreferenceStore>,
}

impl SessionStore {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// Write the full player snapshot in one batch
    pub async fn save_player(&self, state: &PlayerState) -> Result<()> {
        let current_index = state
            .current_index
            .map_or(Value::from(-1), Value::from);

        let entries = vec![
            entry(keys::VOLUME, &state.volume)?,
            entry(keys::MUTED, &state.muted)?,
            entry(keys::SHUFFLE, &state.shuffle)?,
            entry(keys::REPEAT, &state.repeat)?,
            entry(keys::QUEUE, &state.queue)?,
            entry(keys::ORIGINAL_QUEUE, &state.original_queue)?,
            (keys::CURRENT_INDEX.to_string(), current_index),
            entry(keys::CURRENT_TRACK, &state.current_track)?,
            entry(keys::STATUS, &state.status)?,
            entry(keys::POSITION, &state.position.as_secs_f64())?,
        ];

        self.prefs.set_settings(&entries).await?;
        tracing::debug!(
            queue = state.queue.len(),
            status = state.status.as_str(),
            "Saved player snapshot"
        );
        Ok(())
    }

    /// Write only the volume keys
    pub async fn save_volume(&self, volume: f32, muted: bool) -> Result<()> {
        let entries = vec![entry(keys::VOLUME, &volume)?, entry(keys::MUTED, &muted)?];
        self.prefs.set_settings(&entries).await
    }

    /// Read the player snapshot
    ///
    /// Missing keys keep their defaults; so do malformed ones, with a
    /// warning. Only store failures are errors.
    pub async fn load_player(&self) -> Result<PlayerState> {
        let mut state = PlayerState::default();

        if let Some(volume) = self.read::<f32>(keys::VOLUME).await? {
            state.volume = volume;
        }
        if let Some(muted) = self.read(keys::MUTED).await? {
            state.muted = muted;
        }
        if let Some(shuffle) = self.read(keys::SHUFFLE).await? {
            state.shuffle = shuffle;
        }
        if let Some(repeat) = self.read(keys::REPEAT).await? {
            state.repeat = repeat;
        }
        if let Some(queue) = self.read(keys::QUEUE).await? {
            state.queue = queue;
        }
        if let Some(original) = self.read(keys::ORIGINAL_QUEUE).await? {
            state.original_queue = original;
        }
        if let Some(index) = self.read::<i64>(keys::CURRENT_INDEX).await? {
            state.current_index = usize::try_from(index).ok();
        }
        if let Some(track) = self.read(keys::CURRENT_TRACK).await? {
            state.current_track = track;
        }
        if let Some(status) = self.read::<PlaybackStatus>(keys::STATUS).await? {
            state.status = status;
        }
        if let Some(position) = self.read::<f64>(keys::POSITION).await? {
            state.position = secs_to_duration(position);
        }

        Ok(state)
    }

    pub async fn save_library_preferences(&self, prefs: &LibraryPreferences) -> Result<()> {
        let value = serde_json::to_value(prefs)?;
        self.prefs
            .set_setting(keys::LIBRARY_PREFERENCES, &value)
            .await
    }

    /// Read library preferences, falling back to defaults
    pub async fn load_library_preferences(&self) -> Result<LibraryPreferences> {
        Ok(self
            .read(keys::LIBRARY_PREFERENCES)
            .await?
            .unwrap_or_default())
    }

    /// Remove every player key
    pub async fn clear_player(&self) -> Result<()> {
        for key in keys::PLAYER_KEYS {
            self.prefs.delete_setting(key).await?;
        }
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.prefs.get_setting(key).await? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Skipping malformed session key");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

fn entry<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<(String, Value)> {
    Ok((key.to_string(), serde_json::to_value(value)?))
}
