//! Aggregate storage usage
//!
//! Recomputed in the background after every successful write or delete
//! and published on a `watch` channel. Each recomputation carries the
//! revision of the write that scheduled it; a result only replaces the
//! published value when its revision is newer.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::Result;
use crate::{playlists, tracks};

/// Snapshot of what the store currently holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Write revision this snapshot reflects
    pub revision: u64,
    pub track_count: u64,
    pub playlist_count: u64,
    /// Sum of audio and cover payload sizes
    pub payload_bytes: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct UsageMonitor {
    next_revision: Arc<AtomicU64>,
    sender: Arc<watch::Sender<StorageUsage>>,
}

impl UsageMonitor {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(StorageUsage::default());
        Self {
            next_revision: Arc::new(AtomicU64::new(0)),
            sender: Arc::new(sender),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<StorageUsage> {
        self.sender.subscribe()
    }

    pub(crate) fn current(&self) -> StorageUsage {
        *self.sender.borrow()
    }

    /// Recompute in a background task
    pub(crate) fn schedule(&self, pool: SqlitePool) {
        let revision = self.bump();
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            match compute(&pool, revision).await {
                Ok(usage) => {
                    publish(&sender, usage);
                }
                Err(e) => tracing::warn!(revision, error = %e, "Storage usage recomputation failed"),
            }
        });
    }

    /// Recompute and wait for the result
    pub(crate) async fn refresh(&self, pool: &SqlitePool) -> Result<StorageUsage> {
        let revision = self.bump();
        let usage = compute(pool, revision).await?;
        publish(&self.sender, usage);
        Ok(self.current())
    }

    fn bump(&self) -> u64 {
        self.next_revision.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn compute(pool: &SqlitePool, revision: u64) -> Result<StorageUsage> {
    Ok(StorageUsage {
        revision,
        track_count: tracks::count(pool).await?,
        playlist_count: playlists::count(pool).await?,
        payload_bytes: tracks::payload_bytes(pool, None).await?,
    })
}

/// Returns true if `usage` replaced the published value
fn publish(sender: &watch::Sender<StorageUsage>, usage: StorageUsage) -> bool {
    sender.send_if_modified(|current| {
        if usage.revision > current.revision {
            *current = usage;
            true
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(revision: u64, track_count: u64) -> StorageUsage {
        StorageUsage {
            revision,
            track_count,
            ..Default::default()
        }
    }

    #[test]
    fn stale_results_never_overwrite_newer_ones() {
        let (sender, receiver) = watch::channel(StorageUsage::default());

        assert!(publish(&sender, usage(2, 5)));
        assert!(!publish(&sender, usage(1, 9)));

        assert_eq!(receiver.borrow().revision, 2);
        assert_eq!(receiver.borrow().track_count, 5);
    }

    #[test]
    fn revisions_increase_monotonically() {
        let monitor = UsageMonitor::new();
        let a = monitor.bump();
        let b = monitor.bump();
        assert!(b > a);
    }
}
