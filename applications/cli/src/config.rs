/// CLI configuration
use crate::error::{CliError, Result};
use cadenza_library::{SortKey, SortOrder};
use cadenza_playback::PlaybackConfig;
use cadenza_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Upper bound on stored payload bytes (unlimited when unset)
    #[serde(default)]
    pub max_payload_bytes: Option<u64>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Sort used by `list` when none is given
    #[serde(default)]
    pub sort_key: SortKey,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_payload_bytes: None,
            max_connections: default_max_connections(),
        }
    }
}

impl StorageSettings {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_payload_bytes: self.max_payload_bytes,
            max_connections: self.max_connections,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadenza.toml` is read if
    /// present. `CADENZA_*` variables override file values, with `__`
    /// between section and key (`CADENZA_STORAGE__DATABASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENZA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(CliError::Config(
                "database URL is required (set CADENZA_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(CliError::Config(
                "storage.max_connections must be at least 1".to_string(),
            ));
        }

        let volume = self.playback.volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(CliError::Config(format!(
                "playback.volume must be between 0 and 1 (got {volume})"
            )));
        }

        if self.playback.load_timeout_ms == 0 {
            return Err(CliError::Config(
                "playback.load_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://./data/cadenza.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}
