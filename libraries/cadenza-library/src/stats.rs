use cadenza_core::types::{Category, Track};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate library statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_tracks: usize,
    pub total_duration_seconds: f64,
    pub total_plays: u64,
    pub total_likes: u64,
    /// Only categories with at least one track appear here
    pub by_category: BTreeMap<Category, usize>,
}

impl LibraryStats {
    pub fn compute(tracks: &[Track]) -> Self {
        let mut stats = Self::default();
        for track in tracks {
            stats.total_tracks += 1;
            stats.total_duration_seconds += track.duration_seconds;
            stats.total_plays = stats.total_plays.saturating_add(track.plays);
            stats.total_likes = stats.total_likes.saturating_add(track.likes);
            *stats.by_category.entry(track.category).or_insert(0) += 1;
        }
        stats
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
