//! Library view preferences

use cadenza_library::{SortKey, SortOrder};
use serde::{Deserialize, Serialize};

/// How the library is laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Persisted library view settings
///
/// Unknown or missing fields fall back to defaults so older snapshots keep
/// loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryPreferences {
    pub view_mode: ViewMode,
    pub page_size: usize,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl LibraryPreferences {
    pub const DEFAULT_PAGE_SIZE: usize = 12;
}

impl Default for LibraryPreferences {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Grid,
            page_size: Self::DEFAULT_PAGE_SIZE,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
        }
    }
}
