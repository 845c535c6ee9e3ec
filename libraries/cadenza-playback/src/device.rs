//! Audio device contract
//!
//! The engine drives an output device through [`AudioDevice`] commands. The
//! device reports back through [`DeviceEvent`]s on a channel; every event
//! carries the [`LoadToken`] of the load it belongs to, so completions from
//! a superseded load can be told apart from the current one.

use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifies one `load` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadToken(pub u64);

impl LoadToken {
    /// The token following this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// What the device is reporting
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEventKind {
    /// Media is ready to play
    Ready,

    /// Playback position advanced
    TimeUpdate(Duration),

    /// Natural end of the media
    Ended,

    /// Load or decode failure
    Error(String),

    BufferingStart,

    BufferingEnd,
}

/// Event from the audio device, tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub token: LoadToken,
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    pub fn new(token: LoadToken, kind: DeviceEventKind) -> Self {
        Self { token, kind }
    }
}

/// Platform-agnostic audio output
///
/// Commands return once accepted; their outcome arrives later as a
/// [`DeviceEvent`]. A command error means the device refused it outright.
pub trait AudioDevice: Send {
    /// Bind the device to new media, replacing whatever was loaded
    fn load(&mut self, uri: &str, token: LoadToken) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Halt output and release the media
    fn stop(&mut self) -> Result<()>;

    /// Output gain (0.0-1.0), already combined with mute
    fn set_gain(&mut self, gain: f32) -> Result<()>;
}

/// Create the device event channel
pub fn device_channel(capacity: usize) -> (Sender<DeviceEvent>, Receiver<DeviceEvent>) {
    bounded(capacity.max(1))
}

/// Device with no audible output
///
/// Reports every load as ready immediately. Used when no real output is
/// attached (headless tools, tests).
#[derive(Debug, Clone)]
pub struct SilentDevice {
    events: Sender<DeviceEvent>,
    gain: f32,
}

impl SilentDevice {
    pub fn new(events: Sender<DeviceEvent>) -> Self {
        Self { events, gain: 1.0 }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioDevice for SilentDevice {
    fn load(&mut self, uri: &str, token: LoadToken) -> Result<()> {
        tracing::trace!(uri, token = token.0, "Silent device loaded media");
        // A full channel means nobody is pumping; the load timeout covers it.
        let _ = self
            .events
            .try_send(DeviceEvent::new(token, DeviceEventKind::Ready));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn seek(&mut self, _position: Duration) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> Result<()> {
        self.gain = gain;
        Ok(())
    }
}
