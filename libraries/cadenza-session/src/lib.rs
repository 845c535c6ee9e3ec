//! Cadenza Session
//!
//! Persists player state and library preferences across restarts, and ties
//! the library and the playback engine together.
//!
//! Player state is stored under individual `player.*` setting keys so a
//! single corrupt value only loses that value. Library view preferences are
//! one JSON object under `library.preferences`.

#![forbid(unsafe_code)]

pub mod keys;
mod preferences;
mod session;
mod store;

pub use preferences::{LibraryPreferences, ViewMode};
pub use session::Session;
pub use store::SessionStore;
