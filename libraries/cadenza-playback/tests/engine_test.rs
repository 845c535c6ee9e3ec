//! Playback engine scenarios
//!
//! Drives the engine through a recording device and feeds device events in
//! by hand.


use cadenza_core::types::TrackId;
use cadenza_playback::{
    device_channel, DeviceEvent, DeviceEventKind, LoadToken, PlaybackConfig, PlaybackError,
    PlaybackEvent, PlaybackStatus, PlayerState,
};
use mock_device::*;
use std::time::{Duration, Instant};

// ===== Loading =====

#[test]
fn set_queue_loads_then_plays() {
    let (mut engine, log) = engine();

    engine.set_queue(tracks(&["t1"]), 0).unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(log.loads(), vec!["/music/t1.mp3"]);

    ready(&mut engine, &log);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.queue().current_index(), Some(0));

    let events = engine.drain_events();
    assert!(events.contains(&PlaybackEvent::PlaybackStarted {
        track_id: TrackId::new("t1")
    }));
    assert!(events.contains(&PlaybackEvent::StatusChanged {
        status: PlaybackStatus::Loading
    }));
}

#[test]
fn load_without_autoplay_settles_paused() {
    let (mut engine, log) = engine();

    engine.load(track("a"), false).unwrap();
    ready(&mut engine, &log);

    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert_eq!(engine.position(), Duration::ZERO);
    assert!(!log.commands().contains(&Command::Play));
}

#[test]
fn track_without_audio_is_rejected() {
    let (mut engine, log) = engine();
    let mut silent = track("a");
    silent.audio_uri = String::new();

    let result = engine.load(silent, true);

    assert!(matches!(result, Err(PlaybackError::InvalidOperation(_))));
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert!(log.loads().is_empty());
}

#[test]
fn newer_load_supersedes_older_one() {
    let (mut engine, log) = engine();

    engine.load(track("a"), true).unwrap();
    let stale = log.last_token();
    engine.load(track("b"), true).unwrap();

    engine.handle_device_event(DeviceEvent::new(stale, DeviceEventKind::Ready));
    assert_eq!(engine.status(), PlaybackStatus::Loading);

    engine.handle_device_event(DeviceEvent::new(stale, DeviceEventKind::Error("late".into())));
    assert_eq!(engine.status(), PlaybackStatus::Loading);

    ready(&mut engine, &log);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.current_track().unwrap().id.as_str(), "b");
}

#[test]
fn device_error_stops_and_keeps_queue() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 1).unwrap();
    engine.drain_events();

    device_event(&mut engine, &log, DeviceEventKind::Error("decode failed".into()));

    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.queue().len(), 2);
    assert_eq!(engine.queue().current_index(), Some(1));
    assert!(engine.drain_events().contains(&PlaybackEvent::Error {
        message: "decode failed".into()
    }));
}

#[test]
fn refused_load_surfaces_error() {
    let (mut engine, log) = engine();
    log.refuse_loads(true);

    let result = engine.load(track("a"), true);
    assert!(matches!(result, Err(PlaybackError::Device(_))));
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { .. })));
}

#[test]
fn stalled_load_is_promoted_after_timeout() {
    let (mut engine, _log) = engine_with_config(PlaybackConfig {
        load_timeout_ms: 500,
        ..Default::default()
    });

    engine.load(track("a"), true).unwrap();
    assert!(!engine.check_load_timeout(Instant::now()));
    assert_eq!(engine.status(), PlaybackStatus::Loading);

    let later = Instant::now() + Duration::from_secs(1);
    assert!(engine.check_load_timeout(later));
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert!(!engine.is_loading());
}

#[test]
fn pump_applies_channel_events() {
    let (mut engine, log) = engine();
    let (tx, rx) = device_channel(8);

    engine.load(track("a"), true).unwrap();
    tx.send(DeviceEvent::new(log.last_token(), DeviceEventKind::Ready))
        .unwrap();
    tx.send(DeviceEvent::new(
        log.last_token(),
        DeviceEventKind::TimeUpdate(Duration::from_secs(12)),
    ))
    .unwrap();

    assert_eq!(engine.pump(&rx), 2);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.position(), Duration::from_secs(12));
}

// ===== Transport =====

#[test]
fn play_during_load_records_intent() {
    let (mut engine, log) = engine();

    engine.load(track("a"), false).unwrap();
    engine.play().unwrap();
    ready(&mut engine, &log);
    assert_eq!(engine.status(), PlaybackStatus::Playing);

    engine.load(track("b"), true).unwrap();
    engine.pause().unwrap();
    ready(&mut engine, &log);
    assert_eq!(engine.status(), PlaybackStatus::Paused);
}

#[test]
fn play_with_nothing_loaded_is_noop() {
    let (mut engine, log) = engine();
    engine.play().unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert!(log.loads().is_empty());
}

#[test]
fn pause_and_resume() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    ready(&mut engine, &log);

    engine.pause().unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Paused);
    engine.play().unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Playing);

    let starts = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::PlaybackStarted { .. }))
        .count();
    assert_eq!(starts, 1, "resume must not count another play");
}

#[test]
fn stop_rewinds_and_play_reloads() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    ready(&mut engine, &log);
    device_event(&mut engine, &log, DeviceEventKind::TimeUpdate(Duration::from_secs(30)));

    engine.stop();
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.position(), Duration::ZERO);
    assert_eq!(engine.current_track().unwrap().id.as_str(), "a");

    engine.play().unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert_eq!(log.loads().len(), 2);
}

#[test]
fn events_after_stop_are_ignored() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    let token = log.last_token();
    engine.stop();

    engine.handle_device_event(DeviceEvent::new(token, DeviceEventKind::Ready));
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
}

#[test]
fn seek_clamps_to_duration() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    ready(&mut engine, &log);

    engine.seek(Duration::from_secs(500)).unwrap();
    assert_eq!(engine.position(), Duration::from_secs(180));
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert!(log.commands().contains(&Command::Seek(Duration::from_secs(180))));
}

#[test]
fn seek_during_load_applies_when_ready() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    engine.seek(Duration::from_secs(40)).unwrap();
    assert!(!log.commands().iter().any(|c| matches!(c, Command::Seek(_))));

    ready(&mut engine, &log);
    assert!(log.commands().contains(&Command::Seek(Duration::from_secs(40))));
    assert_eq!(engine.position(), Duration::from_secs(40));
}

#[test]
fn seek_without_track_fails() {
    let (mut engine, _log) = engine();
    assert_eq!(engine.seek(Duration::from_secs(1)), Err(PlaybackError::NoTrackLoaded));
}

#[test]
fn buffering_is_transient() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    ready(&mut engine, &log);

    device_event(&mut engine, &log, DeviceEventKind::BufferingStart);
    assert_eq!(engine.status(), PlaybackStatus::Buffering);
    device_event(&mut engine, &log, DeviceEventKind::BufferingEnd);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

// ===== Track end =====

#[test]
fn end_of_last_track_stops() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 1).unwrap();
    ready(&mut engine, &log);

    device_event(&mut engine, &log, DeviceEventKind::Ended);

    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.queue().current_index(), Some(1));
    assert!(engine.drain_events().contains(&PlaybackEvent::TrackFinished {
        track_id: TrackId::new("b")
    }));
}

#[test]
fn end_of_track_advances() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 0).unwrap();
    ready(&mut engine, &log);

    device_event(&mut engine, &log, DeviceEventKind::Ended);

    assert_eq!(engine.queue().current_index(), Some(1));
    assert_eq!(engine.current_track().unwrap().id.as_str(), "b");
    assert_eq!(engine.status(), PlaybackStatus::Loading);
}

#[test]
fn repeat_replays_single_track() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a"]), 0).unwrap();
    engine.toggle_repeat();
    ready(&mut engine, &log);
    device_event(&mut engine, &log, DeviceEventKind::TimeUpdate(Duration::from_secs(179)));
    engine.drain_events();

    device_event(&mut engine, &log, DeviceEventKind::Ended);

    assert_eq!(engine.position(), Duration::ZERO);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(log.loads().len(), 1);

    let events = engine.drain_events();
    assert!(events.contains(&PlaybackEvent::PlaybackStarted {
        track_id: TrackId::new("a")
    }));
}

// ===== Queue =====

#[test]
fn remove_before_current_shifts_index() {
    let (mut engine, _log) = engine();
    engine.set_queue(tracks(&["a", "b", "c", "d"]), 2).unwrap();

    engine.remove_from_queue(0).unwrap();

    assert_eq!(engine.queue().current_index(), Some(1));
    assert_eq!(engine.queue().get(2).unwrap().id.as_str(), "d");
}

#[test]
fn remove_out_of_range_fails() {
    let (mut engine, _log) = engine();
    engine.set_queue(tracks(&["a"]), 0).unwrap();
    assert_eq!(
        engine.remove_from_queue(3).unwrap_err(),
        PlaybackError::IndexOutOfBounds(3)
    );
}

#[test]
fn add_to_queue_play_next() {
    let (mut engine, _log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 0).unwrap();

    engine.add_to_queue(track("x"), true);
    engine.add_to_queue(track("y"), false);

    assert_eq!(queue_ids(&engine), vec!["a", "x", "b", "y"]);
    assert_eq!(engine.queue().original().len(), 4);
}

#[test]
fn add_to_empty_queue_does_not_load() {
    let (mut engine, log) = engine();
    engine.add_to_queue(track("a"), false);

    assert_eq!(engine.queue().current_index(), Some(0));
    assert!(log.loads().is_empty());
    assert_eq!(engine.status(), PlaybackStatus::Stopped);

    engine.play().unwrap();
    assert_eq!(log.loads(), vec!["/music/a.mp3"]);
}

#[test]
fn set_queue_out_of_range_start_does_not_load() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 9).unwrap();

    assert_eq!(engine.queue().current_index(), Some(0));
    assert!(log.loads().is_empty());
}

#[test]
fn remove_current_track_stops_playback() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b", "a"]), 0).unwrap();
    ready(&mut engine, &log);

    let removed = engine.remove_track(&TrackId::new("a"));

    assert_eq!(removed, 2);
    assert_eq!(queue_ids(&engine), vec!["b"]);
    assert!(engine.current_track().is_none());
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert!(log.commands().contains(&Command::Stop));
}

#[test]
fn remove_other_track_keeps_playing() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b", "c"]), 2).unwrap();
    ready(&mut engine, &log);

    assert_eq!(engine.remove_track(&TrackId::new("a")), 1);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.queue().current().unwrap().id.as_str(), "c");
}

#[test]
fn reorder_and_clear() {
    let (mut engine, _log) = engine();
    engine.set_queue(tracks(&["a", "b", "c"]), 0).unwrap();

    engine.reorder_queue(0, 2).unwrap();
    assert_eq!(queue_ids(&engine), vec!["b", "c", "a"]);
    assert_eq!(engine.queue().current_index(), Some(2));

    engine.clear_queue();
    assert!(engine.queue().is_empty());
    assert_eq!(engine.queue().current_index(), None);
    assert_eq!(engine.jump_to(0), Err(PlaybackError::QueueEmpty));
}

#[test]
fn next_wraps_only_with_repeat() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 1).unwrap();

    engine.next().unwrap();
    assert_eq!(engine.queue().current_index(), Some(1));
    assert_eq!(log.loads().len(), 1);

    engine.toggle_repeat();
    engine.next().unwrap();
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(engine.current_track().unwrap().id.as_str(), "a");
}

#[test]
fn previous_restarts_after_threshold() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 1).unwrap();
    ready(&mut engine, &log);
    device_event(&mut engine, &log, DeviceEventKind::TimeUpdate(Duration::from_secs(10)));

    engine.previous().unwrap();
    assert_eq!(engine.queue().current_index(), Some(1));
    assert_eq!(engine.position(), Duration::ZERO);

    engine.previous().unwrap();
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(engine.current_track().unwrap().id.as_str(), "a");
}

#[test]
fn previous_at_first_track_restarts() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 0).unwrap();
    ready(&mut engine, &log);
    device_event(&mut engine, &log, DeviceEventKind::TimeUpdate(Duration::from_secs(1)));

    engine.previous().unwrap();
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(engine.position(), Duration::ZERO);
    assert_eq!(log.loads().len(), 1);
}

// ===== Shuffle, volume, state =====

#[test]
fn shuffle_round_trip_keeps_current_track() {
    let (mut engine, _log) = engine();
    engine
        .set_queue(tracks(&["a", "b", "c", "d", "e", "f"]), 3)
        .unwrap();

    assert!(engine.toggle_shuffle());
    assert_eq!(engine.queue().current().unwrap().id.as_str(), "d");

    assert!(!engine.toggle_shuffle());
    assert_eq!(queue_ids(&engine), vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(engine.queue().current_index(), Some(3));
}

#[test]
fn volume_clamps_and_mute_is_separate() {
    let (mut engine, log) = engine();

    engine.set_volume(1.5);
    assert_eq!(engine.volume(), 1.0);

    engine.set_volume(0.4);
    assert!(engine.toggle_mute());
    assert_eq!(log.last_gain(), Some(0.0));
    assert_eq!(engine.volume(), 0.4);

    engine.set_muted(false);
    assert_eq!(log.last_gain(), Some(0.4));
    assert!(engine.drain_events().contains(&PlaybackEvent::VolumeChanged {
        volume: 0.4,
        muted: true
    }));
}

#[test]
fn state_restore_resumes_playback_at_position() {
    let (mut engine, log) = engine();
    engine.set_queue(tracks(&["a", "b"]), 1).unwrap();
    ready(&mut engine, &log);
    engine.seek(Duration::from_secs(42)).unwrap();
    engine.set_volume(0.3);
    let saved = engine.state();

    let (mut restored, restored_log) = mock_device::engine();
    restored.restore(saved.clone()).unwrap();
    assert_eq!(restored.status(), PlaybackStatus::Loading);
    ready(&mut restored, &restored_log);

    assert_eq!(restored.status(), PlaybackStatus::Playing);
    assert_eq!(restored.position(), Duration::from_secs(42));
    assert_eq!(restored.volume(), 0.3);
    assert_eq!(restored.queue().current_index(), Some(1));
    assert!(restored_log
        .commands()
        .contains(&Command::Seek(Duration::from_secs(42))));
    assert!(!restored
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::PlaybackStarted { .. })));
}

#[test]
fn restore_from_start_does_not_count_a_play() {
    let (mut engine, log) = engine();
    let state = PlayerState {
        current_track: Some(track("a")),
        status: PlaybackStatus::Playing,
        queue: tracks(&["a"]),
        current_index: Some(0),
        ..Default::default()
    };

    engine.restore(state).unwrap();
    ready(&mut engine, &log);

    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.position(), Duration::ZERO);
    assert!(!engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::PlaybackStarted { .. })));
}

#[test]
fn state_reports_where_a_pending_load_settles() {
    let (mut engine, log) = engine();

    engine.load(track("a"), true).unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);

    engine.pause().unwrap();
    assert_eq!(engine.state().status, PlaybackStatus::Paused);

    ready(&mut engine, &log);
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
}

#[test]
fn restore_without_queue_does_not_load() {
    let (mut engine, log) = engine();
    let state = PlayerState {
        current_track: Some(track("a")),
        status: PlaybackStatus::Playing,
        ..Default::default()
    };

    engine.restore(state).unwrap();

    assert!(log.loads().is_empty());
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.current_track().unwrap().id.as_str(), "a");
}

#[test]
fn load_tokens_increase() {
    let (mut engine, log) = engine();
    engine.load(track("a"), true).unwrap();
    let first = log.last_token();
    engine.load(track("b"), true).unwrap();
    assert!(log.last_token() > first);
    assert_ne!(first, LoadToken(0));
}
