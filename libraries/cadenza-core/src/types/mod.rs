mod ids;
mod playlist;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use playlist::Playlist;
pub use track::{Category, MediaRef, NewTrack, Track, TrackUpdate};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the millisecond precision the store keeps
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
