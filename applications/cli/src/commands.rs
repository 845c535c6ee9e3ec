/// Command execution
///
/// Every command returns its output as text; `main` prints it.
use crate::cli::{Commands, PlaylistCommand, SessionCommand};
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::probe;
use cadenza_core::types::{NewTrack, PlaylistId, Track, TrackId, TrackUpdate};
use cadenza_library::{Library, SortKey, SortOrder, TrackFilter};
use cadenza_playback::{device_channel, PlaybackEngine, SilentDevice};
use cadenza_session::{Session, SessionStore};
use cadenza_storage::SqliteStore;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Opened store plus configuration
pub struct App {
    config: AppConfig,
    store: SqliteStore,
}

impl App {
    /// Open (creating if needed) the configured database
    pub async fn open(config: AppConfig) -> Result<Self> {
        config.validate()?;
        ensure_parent_dir(&config.storage.database_url)?;

        let store =
            SqliteStore::open(&config.storage.database_url, config.storage.store_config()).await?;
        tracing::debug!(url = %config.storage.database_url, "Opened store");

        Ok(Self { config, store })
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    async fn library(&self) -> Result<Library> {
        Ok(Library::open(Arc::new(self.store.clone())).await?)
    }

    async fn session(&self) -> Result<Session> {
        let (tx, rx) = device_channel(self.config.playback.event_capacity);
        let engine = PlaybackEngine::new(
            Box::new(SilentDevice::new(tx)),
            self.config.playback.clone(),
        );
        let prefs = SessionStore::new(Arc::new(self.store.clone()));
        Ok(Session::open(self.library().await?, engine, rx, prefs).await?)
    }

    /// Run one command
    pub async fn execute(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Add {
                file,
                title,
                artist,
                category,
                description,
                cover,
                color,
            } => {
                let audio = probe::probe_audio(&file)?;
                let cover = cover.as_deref().map(probe::media_ref).transpose()?;
                let draft = NewTrack {
                    title,
                    artist,
                    description,
                    category,
                    duration_seconds: audio.duration_seconds,
                    audio: Some(audio.media),
                    cover,
                    accent_color: color,
                };

                let track = self.library().await?.create(draft).await?;
                Ok(format!("Added {} ({})", track.title, track.id))
            }

            Commands::List {
                category,
                query,
                sort,
                order,
                json,
            } => {
                let library = self.library().await?;
                let filter = TrackFilter { category, query };
                let key = sort.unwrap_or(self.config.library.sort_key);
                let order = order.unwrap_or(self.config.library.sort_order);
                let tracks = library.filtered_sorted(&filter, key, order);

                if json {
                    Ok(serde_json::to_string_pretty(&tracks)?)
                } else {
                    Ok(format_track_table(&tracks, key, order))
                }
            }

            Commands::Stats { json } => {
                let library = self.library().await?;
                let stats = library.stats();
                if json {
                    return Ok(serde_json::to_string_pretty(stats)?);
                }

                let mut out = String::new();
                let _ = writeln!(out, "Tracks:   {}", stats.total_tracks);
                let _ = writeln!(
                    out,
                    "Duration: {}",
                    format_duration(stats.total_duration_seconds)
                );
                let _ = writeln!(out, "Plays:    {}", stats.total_plays);
                let _ = writeln!(out, "Likes:    {}", stats.total_likes);
                for (category, count) in &stats.by_category {
                    let _ = writeln!(out, "  {:<12} {}", category.as_str(), count);
                }
                Ok(out.trim_end().to_string())
            }

            Commands::Update {
                id,
                title,
                artist,
                category,
                description,
                clear_description,
                cover,
                clear_cover,
                color,
            } => {
                let cover = match (cover, clear_cover) {
                    (_, true) => Some(None),
                    (Some(path), false) => Some(Some(probe::media_ref(&path)?)),
                    (None, false) => None,
                };
                let description = if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                };
                let update = TrackUpdate {
                    title,
                    artist,
                    description,
                    category,
                    cover,
                    accent_color: color.map(Some),
                };

                let track = self
                    .library()
                    .await?
                    .update(&TrackId::new(id), update)
                    .await?;
                Ok(format!("Updated {} ({})", track.title, track.id))
            }

            Commands::Delete { ids } => {
                let mut session = self.session().await?;
                let mut out = String::new();
                for id in ids {
                    let deleted = session.delete_track(&TrackId::new(id.as_str())).await?;
                    let verb = if deleted { "Deleted" } else { "No such track" };
                    let _ = writeln!(out, "{verb}: {id}");
                }
                session.shutdown().await?;
                Ok(out.trim_end().to_string())
            }

            Commands::Like { id } => {
                let likes = self.library().await?.like(&TrackId::new(id.as_str())).await?;
                Ok(format!("{id}: {likes} likes"))
            }

            Commands::Export { output } => {
                let snapshot = self.store.export_snapshot().await?;
                let json = serde_json::to_string_pretty(&snapshot)?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, json)?;
                        Ok(format!(
                            "Exported {} tracks and {} playlists to {}",
                            snapshot.tracks.len(),
                            snapshot.playlists.len(),
                            path.display()
                        ))
                    }
                    None => Ok(json),
                }
            }

            Commands::Import { file } => {
                let document = std::fs::read_to_string(&file)?;
                let report = self.store.import_snapshot(&document).await?;

                let mut out = format!(
                    "Imported {} tracks and {} playlists",
                    report.tracks_imported, report.playlists_imported
                );
                for failure in &report.failures {
                    let _ = write!(
                        out,
                        "\n  skipped {} #{}: {}",
                        failure.kind, failure.index, failure.reason
                    );
                }
                Ok(out)
            }

            Commands::Playlist(command) => self.playlist(command).await,

            Commands::Session(command) => self.session_command(command).await,
        }
    }

    async fn playlist(&self, command: PlaylistCommand) -> Result<String> {
        let mut library = self.library().await?;

        match command {
            PlaylistCommand::List => {
                let mut out = String::new();
                for playlist in library.playlists() {
                    let _ = writeln!(
                        out,
                        "{}  {} ({} tracks{})",
                        playlist.id,
                        playlist.name,
                        playlist.track_ids.len(),
                        if playlist.is_public { ", public" } else { "" }
                    );
                }
                Ok(out.trim_end().to_string())
            }
            PlaylistCommand::Create { name, public } => {
                let playlist = library.create_playlist(&name, public).await?;
                Ok(format!("Created {} ({})", playlist.name, playlist.id))
            }
            PlaylistCommand::Rename { id, name } => {
                let playlist = library
                    .rename_playlist(&PlaylistId::new(id), &name)
                    .await?;
                Ok(format!("Renamed to {}", playlist.name))
            }
            PlaylistCommand::Add { playlist, track } => {
                let playlist = library
                    .add_to_playlist(&PlaylistId::new(playlist), &TrackId::new(track))
                    .await?;
                Ok(format!("{} now has {} tracks", playlist.name, playlist.track_ids.len()))
            }
            PlaylistCommand::Remove { playlist, track } => {
                let playlist = library
                    .remove_from_playlist(&PlaylistId::new(playlist), &TrackId::new(track))
                    .await?;
                Ok(format!("{} now has {} tracks", playlist.name, playlist.track_ids.len()))
            }
            PlaylistCommand::Delete { id } => {
                let deleted = library.delete_playlist(&PlaylistId::new(id.as_str())).await?;
                Ok(if deleted {
                    format!("Deleted playlist {id}")
                } else {
                    format!("No such playlist: {id}")
                })
            }
        }
    }

    async fn session_command(&self, command: SessionCommand) -> Result<String> {
        match command {
            SessionCommand::Show => {
                let state = SessionStore::new(Arc::new(self.store.clone()))
                    .load_player()
                    .await?;
                return Ok(serde_json::to_string_pretty(&state)?);
            }
            SessionCommand::Clear => {
                SessionStore::new(Arc::new(self.store.clone()))
                    .clear_player()
                    .await?;
                return Ok("Session cleared".to_string());
            }
            _ => {}
        }

        let mut session = self.session().await?;
        // Let a restored load settle before applying the command
        session.pump().await?;

        match command {
            SessionCommand::Play { ids, start } => {
                if start >= ids.len() {
                    return Err(CliError::BadArgument(format!(
                        "start {start} is past the end of {} tracks",
                        ids.len()
                    )));
                }
                let ids: Vec<_> = ids.into_iter().map(TrackId::new).collect();
                session.play_tracks(&ids, start)?;
            }
            other => {
                let engine = session.engine_mut();
                match other {
                    SessionCommand::Next => engine.next()?,
                    SessionCommand::Previous => engine.previous()?,
                    SessionCommand::Pause => engine.pause()?,
                    SessionCommand::Volume { level } => engine.set_volume(level),
                    SessionCommand::Mute => {
                        engine.toggle_mute();
                    }
                    SessionCommand::Shuffle => {
                        engine.toggle_shuffle();
                    }
                    SessionCommand::Repeat => {
                        engine.toggle_repeat();
                    }
                    SessionCommand::Play { .. } | SessionCommand::Show | SessionCommand::Clear => {}
                }
            }
        }

        session.pump().await?;
        let summary = describe_session(&session);
        session.shutdown().await?;
        Ok(summary)
    }
}

fn describe_session(session: &Session) -> String {
    let engine = session.engine();
    let now_playing = engine
        .current_track()
        .map_or_else(|| "nothing".to_string(), |t| format!("{} - {}", t.artist, t.title));

    format!(
        "{}: {} [{}/{}] volume {:.0}%{}{}{}",
        engine.status().as_str(),
        now_playing,
        engine.queue().current_index().map_or(0, |i| i + 1),
        engine.queue().len(),
        engine.volume() * 100.0,
        if engine.is_muted() { " muted" } else { "" },
        if engine.is_shuffled() { " shuffle" } else { "" },
        if engine.is_repeat() { " repeat" } else { "" },
    )
}

fn format_track_table(tracks: &[&Track], key: SortKey, order: SortOrder) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} tracks by {} ({})",
        tracks.len(),
        key.as_str(),
        match order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    );
    for track in tracks {
        let _ = writeln!(
            out,
            "{}  {:<30} {:<20} {:<12} {:>6}  {:>4} plays  {:>4} likes",
            track.id,
            track.title,
            track.artist,
            track.category.as_str(),
            format_duration(track.duration_seconds),
            track.plays,
            track.likes
        );
    }
    out.trim_end().to_string()
}

/// `m:ss`, or `h:mm:ss` past an hour
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Create the directory holding a `sqlite://` database file
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
