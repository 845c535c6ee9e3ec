//! Core types for playback management

use cadenza_core::types::{Category, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// "Previous" restarts the current track once playback is past this point
pub const PREVIOUS_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// A load that has not signalled ready by then is treated as ready
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Track snapshot held by the queue
///
/// Copied from the library when queued; the engine never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTrack {
    /// Library track identifier
    pub id: TrackId,

    pub title: String,

    pub artist: String,

    pub category: Category,

    /// Track duration
    #[serde(with = "duration_secs")]
    pub duration: Duration,

    /// Location handed to the audio device
    pub audio_uri: String,

    #[serde(default)]
    pub cover_uri: Option<String>,

    #[serde(default)]
    pub accent_color: Option<String>,
}

impl From<&Track> for QueueTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            category: track.category,
            duration: secs_to_duration(track.duration_seconds),
            audio_uri: track.audio.uri.clone(),
            cover_uri: track.cover.as_ref().map(|c| c.uri.clone()),
            accent_color: track.accent_color.clone(),
        }
    }
}

/// Playback status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing playing; position is zero
    #[default]
    Stopped,

    /// Waiting for the device to signal ready
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Device stalled while playing
    Buffering,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
        }
    }
}

/// Complete player state, as captured for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub current_track: Option<QueueTrack>,
    pub status: PlaybackStatus,
    #[serde(with = "duration_secs")]
    pub position: Duration,
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub queue: Vec<QueueTrack>,
    pub original_queue: Vec<QueueTrack>,
    pub current_index: Option<usize>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Stopped,
            position: Duration::ZERO,
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat: false,
            queue: Vec::new(),
            original_queue: Vec::new(),
            current_index: None,
        }
    }
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Load timeout in milliseconds (default: 10000)
    pub load_timeout_ms: u64,

    /// Restart threshold for "previous" in milliseconds (default: 3000)
    pub previous_restart_threshold_ms: u64,

    /// Device event channel capacity (default: 64)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn previous_restart_threshold(&self) -> Duration {
        Duration::from_millis(self.previous_restart_threshold_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT.as_millis() as u64,
            previous_restart_threshold_ms: PREVIOUS_RESTART_THRESHOLD.as_millis() as u64,
            event_capacity: 64,
        }
    }
}

/// Convert seconds to a `Duration`, mapping negative or non-finite input to zero
pub fn secs_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

/// Serialize durations as fractional seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Ok(super::secs_to_duration(seconds))
    }
}
