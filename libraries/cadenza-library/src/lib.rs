//! Cadenza Library
//!
//! Reactive in-memory index over the persistence store: filtering, sorting,
//! aggregate statistics, validated CRUD with rollback, engagement counters,
//! and playlists.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_library::{Library, SortKey, SortOrder, TrackFilter};
//! # use std::sync::Arc;
//! # async fn example(store: Arc<dyn cadenza_core::TrackStore>) -> cadenza_core::Result<()> {
//! let library = Library::open(store).await?;
//!
//! let filter = TrackFilter {
//!     query: "ambient".to_string(),
//!     ..Default::default()
//! };
//! for track in library.filtered_sorted(&filter, SortKey::Plays, SortOrder::Desc) {
//!     println!("{} - {}", track.artist, track.title);
//! }
//! println!("{} tracks", library.stats().total_tracks);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod index;
mod playlists;
pub mod query;
mod stats;

pub use index::Library;
pub use query::{CategoryFilter, SortKey, SortOrder, TrackFilter};
pub use stats::LibraryStats;
