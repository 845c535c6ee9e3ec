//! Track records
//!
//! Rows store payload references inline (`audio_*`, `cover_*` columns).
//! Timestamps are Unix milliseconds.

use cadenza_core::types::{Category, MediaRef, Track, TrackId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{Result, StorageError};

const TRACK_COLUMNS: &str = "id, title, artist, description, category, duration_seconds, \
     added_at, audio_uri, audio_size, audio_mime, cover_uri, cover_size, cover_mime, \
     accent_color, plays, likes";

/// Upsert a track by id
///
/// # Errors
///
/// Returns an error if the write is rejected
pub async fn put(pool: &SqlitePool, track: &Track) -> Result<TrackId> {
    let cover = track.cover.as_ref();

    sqlx::query(
        "INSERT INTO tracks (id, title, artist, description, category, duration_seconds,
             added_at, audio_uri, audio_size, audio_mime, cover_uri, cover_size, cover_mime,
             accent_color, plays, likes)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             artist = excluded.artist,
             description = excluded.description,
             category = excluded.category,
             duration_seconds = excluded.duration_seconds,
             added_at = excluded.added_at,
             audio_uri = excluded.audio_uri,
             audio_size = excluded.audio_size,
             audio_mime = excluded.audio_mime,
             cover_uri = excluded.cover_uri,
             cover_size = excluded.cover_size,
             cover_mime = excluded.cover_mime,
             accent_color = excluded.accent_color,
             plays = excluded.plays,
             likes = excluded.likes",
    )
    .bind(track.id.as_str())
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.description)
    .bind(track.category.as_str())
    .bind(track.duration_seconds)
    .bind(track.added_at.timestamp_millis())
    .bind(&track.audio.uri)
    .bind(track.audio.size_bytes as i64)
    .bind(&track.audio.mime_type)
    .bind(cover.map(|c| c.uri.as_str()))
    .bind(cover.map(|c| c.size_bytes as i64))
    .bind(cover.map(|c| c.mime_type.as_str()))
    .bind(&track.accent_color)
    .bind(track.plays as i64)
    .bind(track.likes as i64)
    .execute(pool)
    .await?;

    tracing::debug!(track_id = %track.id, "Stored track");
    Ok(track.id.clone())
}

/// Get a track by id
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt
pub async fn get(pool: &SqlitePool, id: &TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_track).transpose()
}

/// Get all tracks
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    fetch_many(pool, &format!("SELECT {TRACK_COLUMNS} FROM tracks"), None).await
}

/// Delete a track; missing ids are ignored
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn delete(pool: &SqlitePool, id: &TrackId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Tracks in one category, newest first
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn get_by_category(pool: &SqlitePool, category: Category) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE category = ? ORDER BY added_at DESC"
    ))
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_track).collect()
}

/// Most recently added tracks
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn get_recently_added(pool: &SqlitePool, limit: u32) -> Result<Vec<Track>> {
    fetch_many(
        pool,
        &format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY added_at DESC LIMIT ?"),
        Some(limit),
    )
    .await
}

/// Most played tracks
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn get_most_played(pool: &SqlitePool, limit: u32) -> Result<Vec<Track>> {
    fetch_many(
        pool,
        &format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY plays DESC, added_at ASC LIMIT ?"),
        Some(limit),
    )
    .await
}

/// Most liked tracks
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn get_most_liked(pool: &SqlitePool, limit: u32) -> Result<Vec<Track>> {
    fetch_many(
        pool,
        &format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY likes DESC, added_at ASC LIMIT ?"),
        Some(limit),
    )
    .await
}

/// Sum of stored payload sizes, optionally excluding one track
pub(crate) async fn payload_bytes(pool: &SqlitePool, excluding: Option<&TrackId>) -> Result<u64> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(audio_size + COALESCE(cover_size, 0)), 0) AS total
         FROM tracks WHERE id IS NOT ?",
    )
    .bind(excluding.map(TrackId::as_str))
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("total").max(0) as u64)
}

pub(crate) async fn count(pool: &SqlitePool) -> Result<u64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM tracks")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("n").max(0) as u64)
}

async fn fetch_many(pool: &SqlitePool, sql: &str, limit: Option<u32>) -> Result<Vec<Track>> {
    let mut query = sqlx::query(sql);
    if let Some(limit) = limit {
        query = query.bind(i64::from(limit));
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_track).collect()
}

fn row_to_track(row: &SqliteRow) -> Result<Track> {
    let category: String = row.try_get("category")?;
    let category = category
        .parse::<Category>()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let added_at = millis_to_datetime(row.try_get("added_at")?)?;

    let cover = match row.try_get::<Option<String>, _>("cover_uri")? {
        Some(uri) => Some(MediaRef {
            uri,
            size_bytes: row.try_get::<Option<i64>, _>("cover_size")?.unwrap_or(0).max(0) as u64,
            mime_type: row
                .try_get::<Option<String>, _>("cover_mime")?
                .unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Track {
        id: TrackId::new(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        description: row.try_get("description")?,
        category,
        duration_seconds: row.try_get("duration_seconds")?,
        added_at,
        audio: MediaRef {
            uri: row.try_get("audio_uri")?,
            size_bytes: row.try_get::<i64, _>("audio_size")?.max(0) as u64,
            mime_type: row.try_get("audio_mime")?,
        },
        cover,
        accent_color: row.try_get("accent_color")?,
        plays: row.try_get::<i64, _>("plays")?.max(0) as u64,
        likes: row.try_get::<i64, _>("likes")?.max(0) as u64,
    })
}

pub(crate) fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Serialization(format!("Invalid timestamp: {millis}")))
}
