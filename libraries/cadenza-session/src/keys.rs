//! Setting keys used for session state

pub const VOLUME: &str = "player.volume";
pub const MUTED: &str = "player.muted";
pub const SHUFFLE: &str = "player.shuffle";
pub const REPEAT: &str = "player.repeat";
pub const QUEUE: &str = "player.queue";
pub const ORIGINAL_QUEUE: &str = "player.original_queue";
pub const CURRENT_INDEX: &str = "player.current_index";
pub const CURRENT_TRACK: &str = "player.current_track";
pub const STATUS: &str = "player.status";
pub const POSITION: &str = "player.position";

/// Library view preferences (one JSON object)
pub const LIBRARY_PREFERENCES: &str = "library.preferences";

/// Every player key, in snapshot order
pub const PLAYER_KEYS: [&str; 10] = [
    VOLUME,
    MUTED,
    SHUFFLE,
    REPEAT,
    QUEUE,
    ORIGINAL_QUEUE,
    CURRENT_INDEX,
    CURRENT_TRACK,
    STATUS,
    POSITION,
];
