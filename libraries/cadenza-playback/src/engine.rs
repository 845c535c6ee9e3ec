//! Playback engine
//!
//! Owns the "now playing" state machine, the play queue, shuffle/repeat
//! modes and volume, and drives an [`AudioDevice`]. Device feedback comes
//! back as [`DeviceEvent`]s which the owner feeds in through
//! [`PlaybackEngine::handle_device_event`] or [`PlaybackEngine::pump`].
//!
//! State changes are queued as [`PlaybackEvent`]s and collected with
//! [`PlaybackEngine::drain_events`].

use crate::device::{AudioDevice, DeviceEvent, DeviceEventKind, LoadToken};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::queue::Queue;
use crate::types::{PlaybackConfig, PlaybackStatus, PlayerState, QueueTrack};
use crate::volume::Volume;
use cadenza_core::types::TrackId;
use crossbeam_channel::Receiver;
use rand::{thread_rng, Rng};
use std::time::{Duration, Instant};

/// A load waiting for the device to report ready
#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    token: LoadToken,
    /// Start playing once ready, otherwise settle in `Paused`
    autoplay: bool,
    started: Instant,
    /// Position to seek to once ready
    resume_at: Duration,
}

/// Main playback engine
pub struct PlaybackEngine {
    device: Box<dyn AudioDevice>,
    config: PlaybackConfig,

    status: PlaybackStatus,
    current_track: Option<QueueTrack>,
    position: Duration,

    queue: Queue,
    volume: Volume,
    repeat: bool,

    // Last token handed out; only events for `active` are applied
    last_token: LoadToken,
    active: Option<LoadToken>,
    pending_load: Option<PendingLoad>,

    // Whether PlaybackStarted was already emitted for the active load
    play_counted: bool,

    // Event queue for the owner
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create new playback engine
    pub fn new(device: Box<dyn AudioDevice>, config: PlaybackConfig) -> Self {
        let mut engine = Self {
            device,
            volume: Volume::new(config.volume),
            config,
            status: PlaybackStatus::Stopped,
            current_track: None,
            position: Duration::ZERO,
            queue: Queue::new(),
            repeat: false,
            last_token: LoadToken(0),
            active: None,
            pending_load: None,
            play_counted: false,
            pending_events: Vec::new(),
        };
        engine.apply_gain();
        engine
    }

    // ===== Loading =====

    /// Bind the device to `track`
    ///
    /// Supersedes any load still in flight. Once the device reports ready
    /// the engine plays (`autoplay`) or settles paused at position zero.
    pub fn load(&mut self, track: QueueTrack, autoplay: bool) -> Result<()> {
        self.load_at(track, autoplay, Duration::ZERO, false)
    }

    /// `counted` marks the play as already counted, so reaching `Playing`
    /// does not emit `PlaybackStarted`
    fn load_at(
        &mut self,
        track: QueueTrack,
        autoplay: bool,
        resume_at: Duration,
        counted: bool,
    ) -> Result<()> {
        if track.audio_uri.trim().is_empty() {
            return Err(PlaybackError::InvalidOperation(format!(
                "track {} has no audio",
                track.id
            )));
        }

        let token = self.last_token.next();
        self.last_token = token;
        self.active = Some(token);

        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());
        let resume_at = resume_at.min(track.duration);
        let uri = track.audio_uri.clone();
        let track_id = track.id.clone();

        tracing::debug!(track_id = %track_id, token = token.0, autoplay, "Loading track");

        self.current_track = Some(track);
        self.position = resume_at;
        self.play_counted = counted;
        self.pending_load = Some(PendingLoad {
            token,
            autoplay,
            started: Instant::now(),
            resume_at,
        });
        self.set_status(PlaybackStatus::Loading);
        if previous_track_id.as_ref() != Some(&track_id) {
            self.emit_track_changed(Some(track_id), previous_track_id);
        }

        self.device_call(|device| device.load(&uri, token))
    }

    /// Apply one device event
    ///
    /// Events tagged with a token other than the active load are dropped.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        if self.active != Some(event.token) {
            tracing::trace!(token = event.token.0, "Ignoring event from superseded load");
            return;
        }

        match event.kind {
            DeviceEventKind::Ready => {
                if let Some(pending) = self.pending_load.filter(|p| p.token == event.token) {
                    self.finish_load(pending);
                }
            }
            DeviceEventKind::TimeUpdate(position) => {
                if self.pending_load.is_none() {
                    let duration = self.duration().unwrap_or(position);
                    self.position = position.min(duration);
                    self.emit_position_changed();
                }
            }
            DeviceEventKind::Ended => self.handle_track_end(),
            DeviceEventKind::Error(message) => self.fail(message),
            DeviceEventKind::BufferingStart => {
                if self.status == PlaybackStatus::Playing {
                    self.set_status(PlaybackStatus::Buffering);
                }
            }
            DeviceEventKind::BufferingEnd => {
                if self.status == PlaybackStatus::Buffering {
                    self.set_status(PlaybackStatus::Playing);
                }
            }
        }
    }

    /// Apply every queued device event, then check the load timeout
    ///
    /// Returns the number of device events applied.
    pub fn pump(&mut self, events: &Receiver<DeviceEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_device_event(event);
            applied += 1;
        }
        self.check_load_timeout(Instant::now());
        applied
    }

    /// Promote a load that has waited longer than the configured timeout
    ///
    /// The engine proceeds as if the device had reported ready. Returns true
    /// if a load was promoted.
    pub fn check_load_timeout(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending_load else {
            return false;
        };
        if now.saturating_duration_since(pending.started) < self.config.load_timeout() {
            return false;
        }

        tracing::warn!(
            token = pending.token.0,
            timeout_ms = self.config.load_timeout_ms,
            "Load timed out, assuming ready"
        );
        self.finish_load(pending);
        true
    }

    fn finish_load(&mut self, pending: PendingLoad) {
        self.pending_load = None;

        if pending.resume_at > Duration::ZERO {
            if let Err(e) = self.device.seek(pending.resume_at) {
                tracing::warn!("Failed to restore position: {}", e);
                self.position = Duration::ZERO;
            }
            self.emit_position_changed();
        }

        if pending.autoplay {
            if self.device_call(|device| device.play()).is_ok() {
                self.set_playing();
            }
        } else {
            self.set_status(PlaybackStatus::Paused);
        }
    }

    fn handle_track_end(&mut self) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };
        self.pending_events
            .push(PlaybackEvent::TrackFinished { track_id });

        if self.repeat {
            self.position = Duration::ZERO;
            self.play_counted = false;
            let replay = self.device_call(|device| {
                device.seek(Duration::ZERO)?;
                device.play()
            });
            if replay.is_ok() {
                self.emit_position_changed();
                self.set_playing();
            }
            return;
        }

        if self.queue.has_next() {
            let next = self.queue.current_index().map_or(0, |i| i + 1);
            // Load errors were already surfaced as events
            let _ = self.jump_to(next);
            return;
        }

        tracing::debug!("Reached end of queue");
        self.active = None;
        self.position = Duration::ZERO;
        self.set_status(PlaybackStatus::Stopped);
    }

    /// Reset to stopped after a device failure; queue and modes are kept
    fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "Playback device error");

        if let Err(e) = self.device.stop() {
            tracing::debug!("Device stop after failure also failed: {}", e);
        }
        self.active = None;
        self.pending_load = None;
        self.position = Duration::ZERO;
        self.set_status(PlaybackStatus::Stopped);
        self.emit_error(message);
    }

    /// Run a device command; a refused command resets playback
    fn device_call<F>(&mut self, command: F) -> Result<()>
    where
        F: FnOnce(&mut dyn AudioDevice) -> Result<()>,
    {
        let result = command(self.device.as_mut());
        if let Err(e) = &result {
            self.fail(e.to_string());
        }
        result
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// While loading this records the intent to play once ready. When
    /// stopped the current track (or the queue's current entry) is
    /// reloaded. Does nothing if there is nothing to play.
    pub fn play(&mut self) -> Result<()> {
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Buffering => Ok(()),
            PlaybackStatus::Loading => {
                if let Some(pending) = self.pending_load.as_mut() {
                    pending.autoplay = true;
                }
                Ok(())
            }
            PlaybackStatus::Paused => {
                self.device_call(|device| device.play())?;
                self.set_playing();
                Ok(())
            }
            PlaybackStatus::Stopped => {
                let track = self
                    .current_track
                    .clone()
                    .or_else(|| self.queue.current().cloned());
                match track {
                    Some(track) => {
                        let resume_at = self.position;
                        self.load_at(track, true, resume_at, resume_at > Duration::ZERO)
                    }
                    None => {
                        tracing::debug!("Nothing to play");
                        Ok(())
                    }
                }
            }
        }
    }

    /// Pause playback
    ///
    /// While loading this cancels a pending autoplay.
    pub fn pause(&mut self) -> Result<()> {
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Buffering => {
                self.device_call(|device| device.pause())?;
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Loading => {
                if let Some(pending) = self.pending_load.as_mut() {
                    pending.autoplay = false;
                }
            }
            PlaybackStatus::Paused | PlaybackStatus::Stopped => {}
        }
        Ok(())
    }

    /// Toggle between playing and paused
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Buffering => self.pause(),
            PlaybackStatus::Loading
                if self.pending_load.is_some_and(|pending| pending.autoplay) =>
            {
                self.pause()
            }
            _ => self.play(),
        }
    }

    /// Stop playback and rewind
    ///
    /// The current track stays selected; a later `play` reloads it.
    pub fn stop(&mut self) {
        if self.active.is_some() {
            if let Err(e) = self.device.stop() {
                tracing::warn!("Device stop failed: {}", e);
            }
        }
        self.active = None;
        self.pending_load = None;
        if self.position != Duration::ZERO {
            self.position = Duration::ZERO;
            self.emit_position_changed();
        }
        self.set_status(PlaybackStatus::Stopped);
    }

    // ===== Seek =====

    /// Seek within the current track
    ///
    /// The target is clamped to `[0, duration]`; status is unchanged. During
    /// a load the target is applied once the device is ready.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let duration = self.duration().ok_or(PlaybackError::NoTrackLoaded)?;
        let target = position.min(duration);

        if let Some(pending) = self.pending_load.as_mut() {
            pending.resume_at = target;
        } else if self.active.is_some() {
            self.device.seek(target)?;
        }

        self.position = target;
        self.emit_position_changed();
        Ok(())
    }

    // ===== Queue Management =====

    /// Replace the queue and start playing `tracks[start]`
    ///
    /// An out-of-range `start` selects the first entry without loading.
    pub fn set_queue(&mut self, tracks: Vec<QueueTrack>, start: usize) -> Result<()> {
        let track = self.queue.set(tracks, start).cloned();
        self.emit_queue_changed();

        match track {
            Some(track) => self.load(track, true),
            None => Ok(()),
        }
    }

    /// Insert a track after the current entry (`play_next`) or at the end
    pub fn add_to_queue(&mut self, track: QueueTrack, play_next: bool) {
        self.queue.insert(track, play_next);
        self.emit_queue_changed();
    }

    /// Remove a queue entry by position
    pub fn remove_from_queue(&mut self, index: usize) -> Result<QueueTrack> {
        let removed = self.queue.remove(index)?;
        self.emit_queue_changed();
        Ok(removed)
    }

    /// Evict every occurrence of a track
    ///
    /// If it is the current track, playback stops and the track is cleared.
    /// Returns the number of queue entries removed.
    pub fn remove_track(&mut self, id: &TrackId) -> usize {
        let removed = self.queue.remove_id(id);
        if removed > 0 {
            self.emit_queue_changed();
        }

        if self.current_track.as_ref().is_some_and(|t| &t.id == id) {
            self.stop();
            self.current_track = None;
            self.emit_track_changed(None, Some(id.clone()));
        }

        removed
    }

    /// Move a queue entry
    pub fn reorder_queue(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.reorder(from, to)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Clear the queue; the current track keeps playing
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
    }

    /// Play the queue entry at `index`
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        if self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        let track = self.queue.set_current(index)?.clone();
        self.emit_queue_changed();
        self.load(track, true)
    }

    /// Advance to the next queue entry
    ///
    /// Wraps to the first entry when repeat is on; otherwise does nothing at
    /// the end of the queue.
    pub fn next(&mut self) -> Result<()> {
        if self.queue.has_next() {
            let next = self.queue.current_index().map_or(0, |i| i + 1);
            self.jump_to(next)
        } else if self.repeat && !self.queue.is_empty() {
            self.jump_to(0)
        } else {
            Ok(())
        }
    }

    /// Go to the previous queue entry
    ///
    /// Restarts the current track instead when playback is past the restart
    /// threshold or there is no previous entry.
    pub fn previous(&mut self) -> Result<()> {
        let restart = self.position > self.config.previous_restart_threshold()
            || !self.queue.has_previous();

        if restart {
            if self.current_track.is_some() {
                self.seek(Duration::ZERO)?;
            }
            return Ok(());
        }

        let previous = self.queue.current_index().map_or(0, |i| i.saturating_sub(1));
        self.jump_to(previous)
    }

    // ===== Shuffle & Repeat =====

    /// Toggle shuffle; returns the new state
    pub fn toggle_shuffle(&mut self) -> bool {
        self.toggle_shuffle_with(&mut thread_rng())
    }

    /// Toggle shuffle with a caller-supplied RNG
    ///
    /// The current-index pointer follows the current track's id.
    pub fn toggle_shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let anchor = self
            .current_track
            .as_ref()
            .or_else(|| self.queue.current())
            .map(|t| t.id.clone());

        if self.queue.is_shuffled() {
            self.queue.unshuffle(anchor.as_ref());
        } else {
            self.queue.shuffle(anchor.as_ref(), rng);
        }

        let enabled = self.queue.is_shuffled();
        self.pending_events
            .push(PlaybackEvent::ShuffleChanged { enabled });
        self.emit_queue_changed();
        enabled
    }

    /// Toggle repeat; returns the new state
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.pending_events.push(PlaybackEvent::RepeatChanged {
            enabled: self.repeat,
        });
        self.repeat
    }

    // ===== Volume =====

    /// Set volume level, clamped to `[0, 1]`
    pub fn set_volume(&mut self, level: f32) {
        if self.volume.set_level(level) {
            self.apply_gain();
            self.emit_volume_changed();
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.volume.set_muted(muted) {
            self.apply_gain();
            self.emit_volume_changed();
        }
    }

    /// Toggle mute; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.volume.is_muted();
        self.set_muted(muted);
        muted
    }

    fn apply_gain(&mut self) {
        if let Err(e) = self.device.set_gain(self.volume.gain()) {
            tracing::warn!("Failed to apply gain: {}", e);
        }
    }

    // ===== State =====

    /// Capture the full player state
    ///
    /// A load still in flight is reported as the status it will settle in.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            current_track: self.current_track.clone(),
            status: self.settled_status(),
            position: self.position,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            shuffle: self.queue.is_shuffled(),
            repeat: self.repeat,
            queue: self.queue.tracks().to_vec(),
            original_queue: self.queue.original().to_vec(),
            current_index: self.queue.current_index(),
        }
    }

    /// Status to persist: a load in flight reports where it will settle
    fn settled_status(&self) -> PlaybackStatus {
        match (self.status, self.pending_load) {
            (PlaybackStatus::Loading, Some(pending)) if pending.autoplay => PlaybackStatus::Playing,
            (PlaybackStatus::Loading, Some(_)) => PlaybackStatus::Paused,
            (status, _) => status,
        }
    }

    /// Install a previously captured state
    ///
    /// If both a current track and a queue are present the track is
    /// reloaded, resuming playback if it was playing and seeking to the
    /// stored position once ready.
    pub fn restore(&mut self, state: PlayerState) -> Result<()> {
        self.stop();

        self.volume.set_level(state.volume);
        self.volume.set_muted(state.muted);
        self.apply_gain();
        self.emit_volume_changed();

        self.repeat = state.repeat;
        self.pending_events.push(PlaybackEvent::RepeatChanged {
            enabled: self.repeat,
        });

        self.queue.restore(
            state.queue,
            state.original_queue,
            state.current_index,
            state.shuffle,
        );
        self.pending_events.push(PlaybackEvent::ShuffleChanged {
            enabled: self.queue.is_shuffled(),
        });
        self.emit_queue_changed();

        match state.current_track {
            Some(track) if !self.queue.is_empty() => {
                let autoplay = matches!(
                    state.status,
                    PlaybackStatus::Playing | PlaybackStatus::Buffering
                );
                // Resuming a session is not a new play
                self.load_at(track, autoplay, state.position, true)
            }
            track => {
                let previous = self.current_track.as_ref().map(|t| t.id.clone());
                let track_id = track.as_ref().map(|t| t.id.clone());
                self.current_track = track;
                if previous != track_id {
                    self.emit_track_changed(track_id, previous);
                }
                Ok(())
            }
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_track(&self) -> Option<&QueueTrack> {
        self.current_track.as_ref()
    }

    /// Current playback position
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Duration of the current track
    pub fn duration(&self) -> Option<Duration> {
        self.current_track.as_ref().map(|t| t.duration)
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn is_shuffled(&self) -> bool {
        self.queue.is_shuffled()
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            self.status = status;
            self.pending_events
                .push(PlaybackEvent::StatusChanged { status });
        }
    }

    /// Enter `Playing`, counting one play per load
    fn set_playing(&mut self) {
        self.set_status(PlaybackStatus::Playing);
        if !self.play_counted {
            self.play_counted = true;
            if let Some(track) = &self.current_track {
                self.pending_events.push(PlaybackEvent::PlaybackStarted {
                    track_id: track.id.clone(),
                });
            }
        }
    }

    fn emit_track_changed(&mut self, track_id: Option<TrackId>, previous_track_id: Option<TrackId>) {
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }

    fn emit_position_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionChanged {
            position: self.position,
        });
    }

    fn emit_error(&mut self, message: String) {
        self.pending_events.push(PlaybackEvent::Error { message });
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("status", &self.status)
            .field("current_track", &self.current_track.as_ref().map(|t| &t.id))
            .field("position", &self.position)
            .field("queue_len", &self.queue.len())
            .field("current_index", &self.queue.current_index())
            .field("repeat", &self.repeat)
            .field("shuffle", &self.queue.is_shuffled())
            .finish_non_exhaustive()
    }
}
