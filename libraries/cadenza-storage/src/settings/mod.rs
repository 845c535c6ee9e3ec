//! Settings management
//!
//! Settings are key-value pairs with JSON-serialized values. Session state
//! and library preferences both live here.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_storage::settings;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! settings::set_setting(pool, "player.volume", &serde_json::json!(0.8)).await?;
//!
//! let volume = settings::get_setting(pool, "player.volume").await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::error::{Result, StorageError};

/// Setting entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting key
    pub key: String,
    /// Setting value (JSON)
    pub value: Value,
}

/// Get a single setting value
///
/// Returns `Ok(None)` if the key is not set.
///
/// # Errors
///
/// Returns an error if the query fails or the stored value is not JSON
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<Value>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let raw: String = row.try_get("value")?;
            let value = serde_json::from_str(&raw)
                .map_err(|e| StorageError::Serialization(format!("setting {key}: {e}")))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Set a setting value
///
/// # Errors
///
/// Returns an error if the write fails
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &Value) -> Result<()> {
    let value_str = serde_json::to_string(value)?;
    let now = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value_str)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write several settings in one transaction
///
/// Either every entry is stored or none is.
///
/// # Errors
///
/// Returns an error if any write fails
pub async fn set_settings(pool: &SqlitePool, entries: &[(String, Value)]) -> Result<()> {
    let now = chrono::Utc::now().timestamp_millis();
    let mut tx = pool.begin().await?;

    for (key, value) in entries {
        let value_str = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value_str)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!(count = entries.len(), "Stored settings batch");
    Ok(())
}

/// Get every setting, ordered by key
///
/// # Errors
///
/// Returns an error if the query fails or a value is not JSON
pub async fn get_all_settings(pool: &SqlitePool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let key: String = row.try_get("key")?;
            let raw: String = row.try_get("value")?;
            let value = serde_json::from_str(&raw)
                .map_err(|e| StorageError::Serialization(format!("setting {key}: {e}")))?;
            Ok(Setting { key, value })
        })
        .collect()
}

/// Delete a setting
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn delete_setting(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
