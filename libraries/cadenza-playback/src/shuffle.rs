//! Queue randomization
//!
//! Uniform Fisher-Yates: every permutation is equally likely.

use crate::types::QueueTrack;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Shuffle a queue of tracks in place
pub fn shuffle_tracks(tracks: &mut [QueueTrack]) {
    shuffle_tracks_with(tracks, &mut thread_rng());
}

/// Shuffle with a caller-supplied RNG
pub fn shuffle_tracks_with<R: Rng + ?Sized>(tracks: &mut [QueueTrack], rng: &mut R) {
    tracks.shuffle(rng);
}
