//! Playback Events
//!
//! Events are queued by the engine as state changes and drained by the
//! owner, which uses them to refresh views, persist the session, and count
//! plays.

use crate::types::PlaybackStatus;
use cadenza_core::types::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Status changed (loading, playing, paused, etc.)
    StatusChanged { status: PlaybackStatus },

    /// Current track changed
    ///
    /// `track_id` is `None` when the current track was cleared.
    TrackChanged {
        track_id: Option<TrackId>,
        previous_track_id: Option<TrackId>,
    },

    /// Queue contents, order, or pointer changed
    QueueChanged {
        length: usize,
        current_index: Option<usize>,
    },

    /// Volume or mute changed
    VolumeChanged { volume: f32, muted: bool },

    ShuffleChanged { enabled: bool },

    RepeatChanged { enabled: bool },

    /// Position moved by a seek or a device time update
    PositionChanged {
        #[serde(with = "crate::types::duration_secs")]
        position: Duration,
    },

    /// A track started playing from the top
    ///
    /// Emitted once per load (and per repeat replay); the owner counts a
    /// play for each.
    PlaybackStarted { track_id: TrackId },

    /// Track reached its natural end
    TrackFinished { track_id: TrackId },

    /// Device failure surfaced to the user
    Error { message: String },
}

impl PlaybackEvent {
    /// Whether this event changes state worth persisting
    ///
    /// Position ticks are excluded; they are captured with the next
    /// persisted change or at shutdown.
    pub fn is_persistent(&self) -> bool {
        !matches!(
            self,
            Self::PositionChanged { .. } | Self::PlaybackStarted { .. } | Self::Error { .. }
        )
    }
}
