//! Playlist records
//!
//! Track references are kept as an ordered JSON array in `track_ids`.

use cadenza_core::types::{Playlist, PlaylistId, TrackId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::tracks::millis_to_datetime;

/// Upsert a playlist by id
///
/// # Errors
///
/// Returns an error if the write is rejected
pub async fn put(pool: &SqlitePool, playlist: &Playlist) -> Result<PlaylistId> {
    let track_ids = serde_json::to_string(&playlist.track_ids)?;

    sqlx::query(
        "INSERT INTO playlists (id, name, track_ids, is_public, created_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             track_ids = excluded.track_ids,
             is_public = excluded.is_public,
             created_at = excluded.created_at",
    )
    .bind(playlist.id.as_str())
    .bind(&playlist.name)
    .bind(track_ids)
    .bind(playlist.is_public)
    .bind(playlist.created_at.timestamp_millis())
    .execute(pool)
    .await?;

    tracing::debug!(playlist_id = %playlist.id, "Stored playlist");
    Ok(playlist.id.clone())
}

/// Get a playlist by id
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt
pub async fn get(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(
        "SELECT id, name, track_ids, is_public, created_at FROM playlists WHERE id = ?",
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_playlist).transpose()
}

/// Get all playlists, oldest first
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(
        "SELECT id, name, track_ids, is_public, created_at FROM playlists ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_playlist).collect()
}

/// Delete a playlist; missing ids are ignored
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count(pool: &SqlitePool) -> Result<u64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM playlists")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("n").max(0) as u64)
}

fn row_to_playlist(row: &SqliteRow) -> Result<Playlist> {
    let track_ids: Vec<TrackId> = serde_json::from_str(&row.try_get::<String, _>("track_ids")?)?;

    Ok(Playlist {
        id: PlaylistId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        track_ids,
        is_public: row.try_get("is_public")?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}
