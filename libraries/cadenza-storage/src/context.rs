use crate::error::StorageError;
use crate::usage::{StorageUsage, UsageMonitor};
use crate::{create_pool, playlists, schema, settings, tracks, transfer};
use async_trait::async_trait;
use cadenza_core::storage::{PreferenceStore, TrackStore};
use cadenza_core::transfer::{ExportSnapshot, ImportReport};
use cadenza_core::types::{Category, Playlist, PlaylistId, Track, TrackId};
use cadenza_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::watch;

/// Store tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound on total payload bytes; `None` means unlimited
    pub max_payload_bytes: Option<u64>,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: None,
            max_connections: 5,
        }
    }
}

/// Local storage using `SQLite`
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    config: StoreConfig,
    usage: UsageMonitor,
}

impl SqliteStore {
    /// Open (creating if missing) and migrate to the latest schema
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn open(database_url: &str, config: StoreConfig) -> Result<Self> {
        Self::open_at_version(database_url, schema::LATEST_VERSION, config).await
    }

    /// Open at a given logical schema version
    ///
    /// Missing steps up to `version` are applied once; a store already at
    /// or past `version` is left as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or `version` is unknown
    pub async fn open_at_version(
        database_url: &str,
        version: u32,
        config: StoreConfig,
    ) -> Result<Self> {
        let pool = create_pool(database_url, config.max_connections)
            .await
            .map_err(StorageError::from)?;
        schema::migrate_to(&pool, version).await?;

        let store = Self::new(pool, config);
        store.refresh_usage().await?;
        Ok(store)
    }

    /// Wrap an already-migrated pool
    pub fn new(pool: SqlitePool, config: StoreConfig) -> Self {
        Self {
            pool,
            config,
            usage: UsageMonitor::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Persisted schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read
    pub async fn schema_version(&self) -> Result<u32> {
        Ok(schema::current_version(&self.pool).await?)
    }

    /// Subscribe to usage updates
    pub fn usage(&self) -> watch::Receiver<StorageUsage> {
        self.usage.subscribe()
    }

    /// Recompute usage now and wait for it
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregate queries fail
    pub async fn refresh_usage(&self) -> Result<StorageUsage> {
        Ok(self.usage.refresh(&self.pool).await?)
    }

    // Secondary lookups

    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn tracks_by_category(&self, category: Category) -> Result<Vec<Track>> {
        Ok(tracks::get_by_category(&self.pool, category).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn recently_added(&self, limit: u32) -> Result<Vec<Track>> {
        Ok(tracks::get_recently_added(&self.pool, limit).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn most_played(&self, limit: u32) -> Result<Vec<Track>> {
        Ok(tracks::get_most_played(&self.pool, limit).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn most_liked(&self, limit: u32) -> Result<Vec<Track>> {
        Ok(tracks::get_most_liked(&self.pool, limit).await?)
    }

    // Bulk transfer

    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub async fn export_snapshot(&self) -> Result<ExportSnapshot> {
        transfer::export_snapshot(self).await
    }

    /// # Errors
    ///
    /// Returns an error if the document is not a JSON object
    pub async fn import_snapshot(&self, document: &str) -> Result<ImportReport> {
        transfer::import_snapshot(self, document).await
    }

    async fn check_quota(&self, track: &Track) -> std::result::Result<(), StorageError> {
        let Some(limit) = self.config.max_payload_bytes else {
            return Ok(());
        };

        let existing = tracks::payload_bytes(&self.pool, Some(&track.id)).await?;
        let incoming = track.audio.size_bytes + track.cover.as_ref().map_or(0, |c| c.size_bytes);
        let required = existing.saturating_add(incoming);

        if required > limit {
            tracing::warn!(track_id = %track.id, required, limit, "Rejected write over quota");
            return Err(StorageError::QuotaExceeded { required, limit });
        }
        Ok(())
    }
}

#[async_trait]
impl TrackStore for SqliteStore {
    async fn put_track(&self, track: &Track) -> Result<TrackId> {
        self.check_quota(track).await?;
        let id = tracks::put(&self.pool, track).await?;
        self.usage.schedule(self.pool.clone());
        Ok(id)
    }

    async fn get_track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(tracks::get(&self.pool, id).await?)
    }

    async fn get_all_tracks(&self) -> Result<Vec<Track>> {
        Ok(tracks::get_all(&self.pool).await?)
    }

    async fn delete_track(&self, id: &TrackId) -> Result<()> {
        if tracks::delete(&self.pool, id).await? {
            tracing::debug!(track_id = %id, "Deleted track");
        }
        self.usage.schedule(self.pool.clone());
        Ok(())
    }

    async fn put_playlist(&self, playlist: &Playlist) -> Result<PlaylistId> {
        let id = playlists::put(&self.pool, playlist).await?;
        self.usage.schedule(self.pool.clone());
        Ok(id)
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(playlists::get(&self.pool, id).await?)
    }

    async fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(playlists::get_all(&self.pool).await?)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        if playlists::delete(&self.pool, id).await? {
            tracing::debug!(playlist_id = %id, "Deleted playlist");
        }
        self.usage.schedule(self.pool.clone());
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        Ok(settings::get_setting(&self.pool, key).await?)
    }

    async fn set_setting(&self, key: &str, value: &Value) -> Result<()> {
        Ok(settings::set_setting(&self.pool, key, value).await?)
    }

    async fn delete_setting(&self, key: &str) -> Result<()> {
        Ok(settings::delete_setting(&self.pool, key).await?)
    }

    async fn set_settings(&self, entries: &[(String, Value)]) -> Result<()> {
        Ok(settings::set_settings(&self.pool, entries).await?)
    }
}
