//! Bulk export and import
//!
//! Import works record by record: a malformed entry or a rejected write is
//! recorded in the report and the remaining records are still applied.

use cadenza_core::storage::TrackStore;
use cadenza_core::transfer::{ExportSnapshot, ImportReport, EXPORT_FORMAT_VERSION};
use cadenza_core::types::{Playlist, Track};
use cadenza_core::{CadenzaError, Result};
use serde_json::Value;

/// Capture every track and playlist
///
/// # Errors
///
/// Returns an error if the store cannot be read
pub async fn export_snapshot<S: TrackStore + ?Sized>(store: &S) -> Result<ExportSnapshot> {
    let tracks = store.get_all_tracks().await?;
    let playlists = store.get_all_playlists().await?;

    tracing::info!(
        tracks = tracks.len(),
        playlists = playlists.len(),
        "Exported library snapshot"
    );
    Ok(ExportSnapshot::new(tracks, playlists))
}

/// Serialize an export as pretty JSON
///
/// # Errors
///
/// Returns an error if the store cannot be read
pub async fn export_json<S: TrackStore + ?Sized>(store: &S) -> Result<String> {
    let snapshot = export_snapshot(store).await?;
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Upsert every record in an export document
///
/// Unknown fields are ignored. Only a document that is not a JSON object
/// fails as a whole.
///
/// # Errors
///
/// Returns an error if `document` is not a JSON object
pub async fn import_snapshot<S: TrackStore + ?Sized>(
    store: &S,
    document: &str,
) -> Result<ImportReport> {
    let root: Value = serde_json::from_str(document)?;
    let Value::Object(root) = root else {
        return Err(CadenzaError::Other(
            "Import document must be a JSON object".to_string(),
        ));
    };

    match root.get("version").and_then(Value::as_str) {
        Some(EXPORT_FORMAT_VERSION) => {}
        Some(other) => tracing::warn!(version = other, "Importing snapshot with unknown version"),
        None => tracing::warn!("Importing snapshot without version tag"),
    }

    let mut report = ImportReport::default();

    for (index, raw) in records(&root, "tracks").iter().enumerate() {
        let id = record_id(raw);
        let outcome = match serde_json::from_value::<Track>(raw.clone()) {
            Ok(track) => store.put_track(&track).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(()) => report.tracks_imported += 1,
            Err(e) => {
                tracing::warn!(index, id = ?id, error = %e, "Skipped track during import");
                report.record_failure("track", index, id, e.to_string());
            }
        }
    }

    for (index, raw) in records(&root, "playlists").iter().enumerate() {
        let id = record_id(raw);
        let outcome = match serde_json::from_value::<Playlist>(raw.clone()) {
            Ok(playlist) => store.put_playlist(&playlist).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(()) => report.playlists_imported += 1,
            Err(e) => {
                tracing::warn!(index, id = ?id, error = %e, "Skipped playlist during import");
                report.record_failure("playlist", index, id, e.to_string());
            }
        }
    }

    tracing::info!(
        tracks = report.tracks_imported,
        playlists = report.playlists_imported,
        failures = report.failures.len(),
        "Imported library snapshot"
    );
    Ok(report)
}

fn records<'a>(root: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    root.get(key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

fn record_id(raw: &Value) -> Option<String> {
    raw.get("id").and_then(Value::as_str).map(str::to_string)
}
