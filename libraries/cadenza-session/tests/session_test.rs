//! Session persistence tests against a real SQLite file


use cadenza_core::storage::{PreferenceStore, TrackStore};
use cadenza_core::types::{Category, MediaRef, NewTrack, TrackId};
use cadenza_library::{Library, SortKey, SortOrder};
use cadenza_playback::{
    device_channel, DeviceEvent, PlaybackConfig, PlaybackEngine, PlaybackEvent, PlaybackStatus,
    PlayerState, QueueTrack, SilentDevice,
};
use cadenza_session::{keys, LibraryPreferences, Session, SessionStore, ViewMode};
use cadenza_storage::{SqliteStore, StoreConfig};
use crossbeam_channel::Receiver;
use flaky_store::FlakyStore;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    store: SqliteStore,
    _dir: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("session.db").display());
        let store = SqliteStore::open(&url, StoreConfig::default())
            .await
            .expect("Failed to open store");
        Self { store, _dir: dir }
    }

    fn session_store(&self) -> SessionStore {
        SessionStore::new(Arc::new(self.store.clone()))
    }

    async fn session(&self) -> Session {
        let store = Arc::new(self.store.clone());
        self.session_over(store.clone(), store).await
    }

    async fn session_over(
        &self,
        tracks: Arc<dyn TrackStore>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Session {
        let library = Library::open(tracks).await.expect("Failed to open library");
        let (engine, events) = silent_engine();
        Session::open(library, engine, events, SessionStore::new(prefs))
            .await
            .expect("Failed to open session")
    }

    fn flaky(&self) -> Arc<FlakyStore> {
        Arc::new(FlakyStore::new(self.store.clone()))
    }
}

fn silent_engine() -> (PlaybackEngine, Receiver<DeviceEvent>) {
    let (tx, rx) = device_channel(16);
    let engine = PlaybackEngine::new(Box::new(SilentDevice::new(tx)), PlaybackConfig::default());
    (engine, rx)
}

fn draft(title: &str) -> NewTrack {
    NewTrack {
        title: title.to_string(),
        artist: "X".to_string(),
        description: None,
        category: Category::Pop,
        duration_seconds: 180.0,
        audio: Some(MediaRef::new(format!("/music/{title}.mp3"), 1_000, "audio/mpeg")),
        cover: None,
        accent_color: None,
    }
}

fn queue_track(id: &str) -> QueueTrack {
    QueueTrack {
        id: TrackId::new(id),
        title: id.to_uppercase(),
        artist: "X".to_string(),
        category: Category::Jazz,
        duration: Duration::from_secs(200),
        audio_uri: format!("/music/{id}.ogg"),
        cover_uri: None,
        accent_color: Some("#112233".to_string()),
    }
}

// ===== SessionStore =====

#[tokio::test]
async fn player_snapshot_round_trip() {
    let fixture = Fixture::new().await;
    let store = fixture.session_store();

    let state = PlayerState {
        current_track: Some(queue_track("b")),
        status: PlaybackStatus::Paused,
        position: Duration::from_millis(42_500),
        volume: 0.25,
        muted: true,
        shuffle: true,
        repeat: true,
        queue: vec![queue_track("b"), queue_track("a")],
        original_queue: vec![queue_track("a"), queue_track("b")],
        current_index: Some(0),
    };

    store.save_player(&state).await.unwrap();
    let loaded = store.load_player().await.unwrap();

    assert_eq!(loaded, state);
}

#[tokio::test]
async fn empty_store_yields_defaults() {
    let fixture = Fixture::new().await;
    let loaded = fixture.session_store().load_player().await.unwrap();
    assert_eq!(loaded, PlayerState::default());
}

#[tokio::test]
async fn malformed_keys_are_skipped_independently() {
    let fixture = Fixture::new().await;
    let prefs = &fixture.store;
    prefs.set_setting(keys::VOLUME, &json!("loud")).await.unwrap();
    prefs.set_setting(keys::REPEAT, &json!(true)).await.unwrap();
    prefs.set_setting(keys::QUEUE, &json!([{ "id": 3 }])).await.unwrap();
    prefs.set_setting(keys::STATUS, &json!("dancing")).await.unwrap();

    let loaded = fixture.session_store().load_player().await.unwrap();

    assert_eq!(loaded.volume, 1.0);
    assert!(loaded.repeat);
    assert!(loaded.queue.is_empty());
    assert_eq!(loaded.status, PlaybackStatus::Stopped);
}

#[tokio::test]
async fn empty_index_is_stored_as_minus_one() {
    let fixture = Fixture::new().await;
    let store = fixture.session_store();

    store.save_player(&PlayerState::default()).await.unwrap();

    let raw = fixture.store.get_setting(keys::CURRENT_INDEX).await.unwrap();
    assert_eq!(raw, Some(json!(-1)));
    assert_eq!(store.load_player().await.unwrap().current_index, None);
}

#[tokio::test]
async fn clear_player_removes_keys() {
    let fixture = Fixture::new().await;
    let store = fixture.session_store();
    store.save_player(&PlayerState::default()).await.unwrap();

    store.clear_player().await.unwrap();

    for key in keys::PLAYER_KEYS {
        assert!(fixture.store.get_setting(key).await.unwrap().is_none(), "{key}");
    }
}

#[tokio::test]
async fn library_preferences_round_trip() {
    let fixture = Fixture::new().await;
    let store = fixture.session_store();
    assert_eq!(
        store.load_library_preferences().await.unwrap(),
        LibraryPreferences::default()
    );

    let prefs = LibraryPreferences {
        view_mode: ViewMode::List,
        page_size: 50,
        sort_key: SortKey::Plays,
        sort_order: SortOrder::Asc,
    };
    store.save_library_preferences(&prefs).await.unwrap();

    assert_eq!(store.load_library_preferences().await.unwrap(), prefs);
}

// ===== Session =====

#[tokio::test]
async fn playing_counts_a_play_and_persists_state() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;
    let track = session.library_mut().create(draft("Alpha")).await.unwrap();

    session.play_tracks(&[track.id.clone()], 0).unwrap();
    let events = session.pump().await.unwrap();

    assert_eq!(session.engine().status(), PlaybackStatus::Playing);
    assert!(events.contains(&PlaybackEvent::PlaybackStarted {
        track_id: track.id.clone()
    }));
    assert_eq!(session.library().get(&track.id).unwrap().plays, 1);

    let saved = fixture.session_store().load_player().await.unwrap();
    assert_eq!(saved.status, PlaybackStatus::Playing);
    assert_eq!(saved.current_index, Some(0));
}

#[tokio::test]
async fn volume_change_is_saved_immediately() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;

    session.engine_mut().set_volume(0.4);
    session.pump().await.unwrap();

    let saved = fixture.store.get_setting(keys::VOLUME).await.unwrap();
    let volume = saved.and_then(|v| v.as_f64()).unwrap();
    assert!((volume - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn restart_resumes_saved_session() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;
    let a = session.library_mut().create(draft("Alpha")).await.unwrap();
    let b = session.library_mut().create(draft("Beta")).await.unwrap();

    session.play_tracks(&[a.id.clone(), b.id.clone()], 1).unwrap();
    session.pump().await.unwrap();
    session.engine_mut().toggle_repeat();
    session
        .set_preferences(LibraryPreferences {
            page_size: 24,
            ..Default::default()
        })
        .await
        .unwrap();
    session.shutdown().await.unwrap();

    let mut resumed = fixture.session().await;
    assert_eq!(resumed.engine().queue().len(), 2);
    assert_eq!(resumed.engine().queue().current_index(), Some(1));
    assert!(resumed.engine().is_repeat());
    assert_eq!(resumed.preferences().page_size, 24);
    assert_eq!(resumed.engine().status(), PlaybackStatus::Loading);

    resumed.pump().await.unwrap();
    assert_eq!(resumed.engine().status(), PlaybackStatus::Playing);
    assert_eq!(resumed.engine().current_track().unwrap().id, b.id);
}

#[tokio::test]
async fn deleting_a_track_evicts_it_from_the_queue() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;
    let a = session.library_mut().create(draft("Alpha")).await.unwrap();
    let b = session.library_mut().create(draft("Beta")).await.unwrap();
    session.play_tracks(&[a.id.clone(), b.id.clone()], 0).unwrap();
    session.pump().await.unwrap();

    assert!(session.delete_track(&a.id).await.unwrap());
    session.pump().await.unwrap();

    assert_eq!(session.engine().queue().len(), 1);
    assert!(session.engine().current_track().is_none());
    assert_eq!(session.engine().status(), PlaybackStatus::Stopped);
    assert!(fixture.store.get_track(&a.id).await.unwrap().is_none());

    assert!(!session.delete_track(&a.id).await.unwrap());
}

#[tokio::test]
async fn unknown_track_cannot_be_queued() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;

    let err = session
        .play_tracks(&[TrackId::new("missing")], 0)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn shutdown_during_resume_keeps_playing_status() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;
    let a = session.library_mut().create(draft("Alpha")).await.unwrap();
    let b = session.library_mut().create(draft("Beta")).await.unwrap();
    session.play_tracks(&[a.id.clone()], 0).unwrap();
    session.pump().await.unwrap();
    session.shutdown().await.unwrap();

    // Reopen and exit again without pumping in between
    let mut resumed = fixture.session().await;
    assert_eq!(resumed.engine().status(), PlaybackStatus::Loading);
    assert!(resumed.delete_track(&b.id).await.unwrap());
    resumed.shutdown().await.unwrap();

    let saved = fixture.session_store().load_player().await.unwrap();
    assert_eq!(saved.status, PlaybackStatus::Playing);

    let mut next = fixture.session().await;
    next.pump().await.unwrap();
    assert_eq!(next.engine().status(), PlaybackStatus::Playing);
    assert_eq!(next.engine().current_track().unwrap().id, a.id);
}

#[tokio::test]
async fn resuming_a_session_does_not_count_plays() {
    let fixture = Fixture::new().await;
    let mut session = fixture.session().await;
    let track = session.library_mut().create(draft("Alpha")).await.unwrap();
    session.play_tracks(&[track.id.clone()], 0).unwrap();
    session.pump().await.unwrap();
    session.shutdown().await.unwrap();

    for _ in 0..3 {
        let mut resumed = fixture.session().await;
        resumed.pump().await.unwrap();
        assert_eq!(resumed.engine().status(), PlaybackStatus::Playing);
        resumed.shutdown().await.unwrap();
    }

    let stored = fixture.store.get_track(&track.id).await.unwrap().unwrap();
    assert_eq!(stored.plays, 1);
}

#[tokio::test]
async fn delete_evicts_from_queue_when_playlist_write_fails() {
    let fixture = Fixture::new().await;
    let store = fixture.flaky();
    let mut session = fixture.session_over(store.clone(), store.clone()).await;
    let a = session.library_mut().create(draft("Alpha")).await.unwrap();
    let b = session.library_mut().create(draft("Beta")).await.unwrap();
    let playlist = session
        .library_mut()
        .create_playlist("Mix", false)
        .await
        .unwrap();
    session
        .library_mut()
        .add_to_playlist(&playlist.id, &a.id)
        .await
        .unwrap();
    session.play_tracks(&[a.id.clone(), b.id.clone()], 0).unwrap();
    session.pump().await.unwrap();

    store.fail_playlist_writes(true);
    assert!(session.delete_track(&a.id).await.unwrap());

    assert_eq!(session.engine().queue().len(), 1);
    assert!(session.engine().queue().position_of(&a.id).is_none());
    assert!(session.engine().current_track().is_none());
    assert!(fixture.store.get_track(&a.id).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_volume_save_still_counts_the_play() {
    let fixture = Fixture::new().await;
    let store = fixture.flaky();
    let mut session = fixture.session_over(store.clone(), store.clone()).await;
    let track = session.library_mut().create(draft("Alpha")).await.unwrap();

    store.fail_setting_writes(true);
    session.play_tracks(&[track.id.clone()], 0).unwrap();
    session.engine_mut().set_volume(0.5);

    assert!(session.pump().await.is_err());
    assert_eq!(session.library().get(&track.id).unwrap().plays, 1);
}
