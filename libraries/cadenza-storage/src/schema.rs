//! Versioned schema
//!
//! The persisted version lives in `PRAGMA user_version`. Each migration
//! only adds tables or indexes, so stepping forward never rewrites rows.

use crate::error::{Result, StorageError};
use sqlx::{Row, SqlitePool};

/// Ordered migrations; entry `n` upgrades the store to version `n + 1`
const MIGRATIONS: &[&str] = &[
    include_str!("../migrations/0001_create_tables.sql"),
    include_str!("../migrations/0002_create_indexes.sql"),
];

/// Newest schema version this build understands
pub const LATEST_VERSION: u32 = MIGRATIONS.len() as u32;

/// Read the persisted schema version
///
/// # Errors
///
/// Returns an error if the pragma cannot be read
pub async fn current_version(pool: &SqlitePool) -> Result<u32> {
    let row = sqlx::query("PRAGMA user_version").fetch_one(pool).await?;
    let version: i64 = row.try_get(0)?;
    u32::try_from(version).map_err(|_| StorageError::Migration(format!("bad version {version}")))
}

/// Upgrade the store to `target`, applying each missing step once
///
/// Opening an already-newer store at an older target leaves it untouched.
///
/// # Errors
///
/// Returns an error if `target` is unknown or a step fails; a failed step
/// leaves the previous version in place.
pub async fn migrate_to(pool: &SqlitePool, target: u32) -> Result<u32> {
    if target > LATEST_VERSION {
        return Err(StorageError::Migration(format!(
            "unknown schema version {target} (latest is {LATEST_VERSION})"
        )));
    }

    let mut version = current_version(pool).await?;
    while version < target {
        let step = MIGRATIONS[version as usize];
        let next = version + 1;

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(step)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Migration(format!("v{next}: {e}")))?;
        sqlx::raw_sql(&format!("PRAGMA user_version = {next}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Migration(format!("v{next}: {e}")))?;
        tx.commit().await?;

        tracing::info!(version = next, "Applied schema migration");
        version = next;
    }

    Ok(version)
}

/// Upgrade the store to the latest version
///
/// # Errors
///
/// Returns an error if a migration step fails
pub async fn run_migrations(pool: &SqlitePool) -> Result<u32> {
    migrate_to(pool, LATEST_VERSION).await
}
