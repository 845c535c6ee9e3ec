//! Cadenza Storage
//!
//! `SQLite` persistence store for the Cadenza media library.
//!
//! This crate provides durable storage for tracks, playlists, and settings,
//! plus bulk export/import and an observable storage-usage metric.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each record kind owns its own queries
//! - **Versioned Schema**: Migrations tracked in `PRAGMA user_version`
//! - **No Validation**: Records are stored as given; the library layer
//!   validates user input before it reaches this crate
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_core::storage::TrackStore;
//! use cadenza_storage::{SqliteStore, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("sqlite://cadenza.db", StoreConfig::default()).await?;
//!
//! let tracks = store.get_all_tracks().await?;
//! let usage = *store.usage().borrow();
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod playlists;
pub mod settings;
pub mod tracks;

pub mod schema;
pub mod transfer;
pub mod usage;

pub use context::{SqliteStore, StoreConfig};
pub use error::StorageError;
pub use schema::{run_migrations, LATEST_VERSION};
pub use usage::StorageUsage;

use sqlx::sqlite::SqlitePool;

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://cadenza.db`)
/// * `max_connections` - Pool size
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    Ok(pool)
}
