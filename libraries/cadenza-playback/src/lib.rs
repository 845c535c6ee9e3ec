//! Cadenza - Playback Engine
//!
//! Device-agnostic playback management for Cadenza.
//!
//! This crate provides:
//! - The "now playing" status machine (stopped, loading, playing, paused, buffering)
//! - A play queue with a reversible shuffle and repeat
//! - Volume control with non-destructive mute
//! - Load supersession and a bounded load timeout
//!
//! # Architecture
//!
//! The engine never touches audio hardware itself. It drives an
//! [`AudioDevice`] and consumes [`DeviceEvent`]s from a channel; the owner
//! pumps those events in and drains [`PlaybackEvent`]s out.
//!
//! # Example
//!
//! ```rust
//! use cadenza_playback::{device_channel, PlaybackConfig, PlaybackEngine, SilentDevice};
//! use cadenza_playback::{PlaybackStatus, QueueTrack};
//! use cadenza_core::types::{Category, TrackId};
//! use std::time::Duration;
//!
//! let (tx, rx) = device_channel(16);
//! let mut engine = PlaybackEngine::new(Box::new(SilentDevice::new(tx)), PlaybackConfig::default());
//!
//! let track = QueueTrack {
//!     id: TrackId::new("t1"),
//!     title: "Song".to_string(),
//!     artist: "Artist".to_string(),
//!     category: Category::Pop,
//!     duration: Duration::from_secs(180),
//!     audio_uri: "/music/song.mp3".to_string(),
//!     cover_uri: None,
//!     accent_color: None,
//! };
//!
//! engine.set_queue(vec![track], 0).unwrap();
//! assert_eq!(engine.status(), PlaybackStatus::Loading);
//!
//! engine.pump(&rx);
//! assert_eq!(engine.status(), PlaybackStatus::Playing);
//!
//! for event in engine.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

#![forbid(unsafe_code)]

pub mod device;
mod engine;
pub mod error;
pub mod events;
pub mod queue;
pub mod shuffle;
pub mod types;
mod volume;

pub use device::{device_channel, AudioDevice, DeviceEvent, DeviceEventKind, LoadToken, SilentDevice};
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::Queue;
pub use types::{
    secs_to_duration, PlaybackConfig, PlaybackStatus, PlayerState, QueueTrack,
    DEFAULT_LOAD_TIMEOUT, PREVIOUS_RESTART_THRESHOLD,
};
pub use volume::Volume;
