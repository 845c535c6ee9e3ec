//! Bulk export/import document format

use crate::types::{Playlist, Track};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format tag written into every export
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Full library export
///
/// Records are kept as raw JSON on import so that one malformed entry does
/// not reject the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportSnapshot {
    pub fn new(tracks: Vec<Track>, playlists: Vec<Playlist>) -> Self {
        Self {
            tracks,
            playlists,
            export_date: Utc::now(),
            version: EXPORT_FORMAT_VERSION.to_string(),
        }
    }
}

/// Single record that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// `"track"` or `"playlist"`
    pub kind: String,
    /// Position of the record inside its array
    pub index: usize,
    /// Record id, when it could be read
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub tracks_imported: usize,
    pub playlists_imported: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record_failure(
        &mut self,
        kind: &str,
        index: usize,
        id: Option<String>,
        reason: impl Into<String>,
    ) {
        self.failures.push(ImportFailure {
            kind: kind.to_string(),
            index,
            id,
            reason: reason.into(),
        });
    }
}
