//! Play queue
//!
//! A live queue with a current-index pointer plus the pre-shuffle
//! "original" order. Invariant: `current` is `None` exactly when the live
//! queue is empty, and a valid index otherwise.

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffle_tracks_with;
use crate::types::QueueTrack;
use cadenza_core::types::TrackId;
use rand::Rng;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    /// Playback order
    tracks: Vec<QueueTrack>,

    /// Order before shuffle (for restoring)
    original: Vec<QueueTrack>,

    /// Index into `tracks`
    current: Option<usize>,

    /// Whether `tracks` is currently shuffled
    is_shuffled: bool,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both the live and original queues
    ///
    /// Points at `start` when it is in range, otherwise at the first entry.
    /// Returns the track at `start`, if present.
    pub fn set(&mut self, tracks: Vec<QueueTrack>, start: usize) -> Option<&QueueTrack> {
        self.original.clone_from(&tracks);
        self.tracks = tracks;

        self.current = if self.tracks.is_empty() {
            None
        } else {
            Some(start.min(self.tracks.len() - 1))
        };

        self.tracks.get(start)
    }

    /// Insert after the current entry (`play_next`) or append
    ///
    /// The original queue always gets the track appended.
    pub fn insert(&mut self, track: QueueTrack, play_next: bool) {
        self.original.push(track.clone());

        match (self.current, play_next) {
            (Some(current), true) => self.tracks.insert(current + 1, track),
            _ => self.tracks.push(track),
        }

        if self.current.is_none() {
            self.current = Some(0);
        }
    }

    /// Remove the entry at `index`
    ///
    /// Removing at or before the current entry moves the pointer back by one
    /// (never below zero), so it keeps its place among the remaining items.
    pub fn remove(&mut self, index: usize) -> Result<QueueTrack> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        let removed = self.tracks.remove(index);
        self.current = match self.current {
            _ if self.tracks.is_empty() => None,
            Some(current) if index <= current => Some(current.saturating_sub(1)),
            other => other,
        };

        let same_slot = !self.is_shuffled
            && self.original.get(index).is_some_and(|t| t.id == removed.id);
        if same_slot {
            self.original.remove(index);
        } else if let Some(pos) = self.original.iter().position(|t| t.id == removed.id) {
            self.original.remove(pos);
        }

        Ok(removed)
    }

    /// Remove every occurrence of a track; returns how many were removed
    pub fn remove_id(&mut self, id: &TrackId) -> usize {
        let mut removed = 0;
        while let Some(index) = self.position_of(id) {
            if self.remove(index).is_ok() {
                removed += 1;
            }
        }
        self.original.retain(|t| &t.id != id);
        removed
    }

    /// Move an entry; the pointer keeps following the same entry
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tracks.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds(to));
        }
        if from == to {
            return Ok(());
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if let Some(current) = self.current {
            self.current = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(())
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.original.clear();
        self.current = None;
    }

    /// Point at `index`
    pub fn set_current(&mut self, index: usize) -> Result<&QueueTrack> {
        let track = self
            .tracks
            .get(index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.current = Some(index);
        Ok(track)
    }

    /// Shuffle the live queue
    ///
    /// Captures the live order as the new original first, then relocates
    /// the pointer to wherever `anchor` landed.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, anchor: Option<&TrackId>, rng: &mut R) {
        self.original.clone_from(&self.tracks);
        shuffle_tracks_with(&mut self.tracks, rng);
        self.is_shuffled = true;
        self.relocate(anchor);
    }

    /// Restore the original order, relocating the pointer by id
    pub fn unshuffle(&mut self, anchor: Option<&TrackId>) {
        self.tracks.clone_from(&self.original);
        self.is_shuffled = false;
        self.relocate(anchor);
    }

    /// Install persisted state, repairing anything inconsistent
    pub fn restore(
        &mut self,
        tracks: Vec<QueueTrack>,
        original: Vec<QueueTrack>,
        current: Option<usize>,
        shuffled: bool,
    ) {
        self.original = if original.is_empty() {
            tracks.clone()
        } else {
            original
        };
        self.tracks = tracks;
        self.is_shuffled = shuffled;
        self.current = match current {
            _ if self.tracks.is_empty() => None,
            Some(index) if index < self.tracks.len() => Some(index),
            _ => Some(0),
        };
    }

    fn relocate(&mut self, anchor: Option<&TrackId>) {
        let found = anchor.and_then(|id| self.position_of(id));
        self.current = match found {
            Some(index) => Some(index),
            None if self.tracks.is_empty() => None,
            None => Some(0),
        };
    }

    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&QueueTrack> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&QueueTrack> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[QueueTrack] {
        &self.tracks
    }

    pub fn original(&self) -> &[QueueTrack] {
        &self.original
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Check if queue is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.is_shuffled
    }

    pub fn has_next(&self) -> bool {
        self.current.is_some_and(|c| c + 1 < self.tracks.len())
    }

    pub fn has_previous(&self) -> bool {
        self.current.is_some_and(|c| c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::types::Category;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn create_test_track(id: &str) -> QueueTrack {
        QueueTrack {
            id: TrackId::new(id),
            title: format!("Title {id}"),
            artist: "Artist".to_string(),
            category: Category::Pop,
            duration: Duration::from_secs(180),
            audio_uri: format!("/music/{id}.mp3"),
            cover_uri: None,
            accent_color: None,
        }
    }

    fn queue_of(ids: &[&str], start: usize) -> Queue {
        let mut queue = Queue::new();
        queue.set(ids.iter().map(|id| create_test_track(id)).collect(), start);
        queue
    }

    fn ids(tracks: &[QueueTrack]) -> Vec<&str> {
        tracks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn set_points_at_start() {
        let mut queue = queue_of(&["a", "b", "c"], 1);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current().unwrap().id.as_str(), "b");

        assert!(queue.set(Vec::new(), 0).is_none());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn set_with_out_of_range_start_points_at_first() {
        let mut queue = Queue::new();
        let loaded = queue.set(vec![create_test_track("a")], 5).cloned();
        assert!(loaded.is_none());
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn insert_play_next_goes_after_current() {
        let mut queue = queue_of(&["a", "b", "c"], 0);
        queue.insert(create_test_track("x"), true);
        assert_eq!(ids(queue.tracks()), vec!["a", "x", "b", "c"]);
        assert_eq!(ids(queue.original()), vec!["a", "b", "c", "x"]);

        queue.insert(create_test_track("y"), false);
        assert_eq!(ids(queue.tracks()), vec!["a", "x", "b", "c", "y"]);
    }

    #[test]
    fn insert_into_empty_queue_selects_it() {
        let mut queue = Queue::new();
        queue.insert(create_test_track("a"), true);
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn remove_before_current_shifts_pointer() {
        let mut queue = queue_of(&["a", "b", "c", "d"], 2);
        let removed = queue.remove(0).unwrap();

        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.get(2).unwrap().id.as_str(), "d");
    }

    #[test]
    fn remove_current_at_zero_floors() {
        let mut queue = queue_of(&["a", "b"], 0);
        queue.remove(0).unwrap();
        assert_eq!(queue.current_index(), Some(0));

        queue.remove(0).unwrap();
        assert_eq!(queue.current_index(), None);
        assert!(queue.original().is_empty());
    }

    #[test]
    fn remove_after_current_keeps_pointer() {
        let mut queue = queue_of(&["a", "b", "c"], 0);
        queue.remove(2).unwrap();
        assert_eq!(queue.current_index(), Some(0));
        assert!(queue.remove(9).is_err());
    }

    #[test]
    fn remove_id_drops_every_occurrence() {
        let mut queue = queue_of(&["a", "b", "a", "c"], 3);
        assert_eq!(queue.remove_id(&TrackId::new("a")), 2);
        assert_eq!(ids(queue.tracks()), vec!["b", "c"]);
        assert_eq!(queue.current().unwrap().id.as_str(), "c");
        assert!(!ids(queue.original()).contains(&"a"));
    }

    #[test]
    fn reorder_follows_current_entry() {
        let mut queue = queue_of(&["a", "b", "c", "d"], 1);
        queue.reorder(1, 3).unwrap();
        assert_eq!(ids(queue.tracks()), vec!["a", "c", "d", "b"]);
        assert_eq!(queue.current_index(), Some(3));

        queue.reorder(0, 3).unwrap();
        assert_eq!(queue.current_index(), Some(2));

        queue.reorder(3, 0).unwrap();
        assert_eq!(queue.current_index(), Some(3));
        assert_eq!(queue.current().unwrap().id.as_str(), "b");
    }

    #[test]
    fn shuffle_and_restore_keep_current_id() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"], 2);
        let anchor = TrackId::new("c");

        queue.shuffle(Some(&anchor), &mut StdRng::seed_from_u64(3));
        assert!(queue.is_shuffled());
        assert_eq!(queue.current().unwrap().id, anchor);
        assert_eq!(ids(queue.original()), vec!["a", "b", "c", "d", "e"]);

        queue.unshuffle(Some(&anchor));
        assert!(!queue.is_shuffled());
        assert_eq!(ids(queue.tracks()), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn unshuffle_with_missing_anchor_points_at_first() {
        let mut queue = queue_of(&["a", "b"], 1);
        queue.shuffle(None, &mut StdRng::seed_from_u64(1));
        queue.unshuffle(Some(&TrackId::new("gone")));
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn restore_repairs_bad_index() {
        let mut queue = Queue::new();
        let tracks = vec![create_test_track("a"), create_test_track("b")];
        queue.restore(tracks.clone(), Vec::new(), Some(7), false);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.original(), tracks.as_slice());

        queue.restore(Vec::new(), Vec::new(), Some(1), false);
        assert_eq!(queue.current_index(), None);
    }
}
