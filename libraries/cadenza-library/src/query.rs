//! Filtering and sorting over the projection

use cadenza_core::types::{Category, Track};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Category filter; `All` applies no filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    #[serde(untagged)]
    Only(Category),
}

impl CategoryFilter {
    fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = cadenza_core::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Track filter: category plus free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFilter {
    pub category: CategoryFilter,
    /// Case-insensitive substring matched against title, artist,
    /// description and category; blank matches everything
    pub query: String,
}

impl TrackFilter {
    pub fn matches(&self, track: &Track) -> bool {
        if !self.category.matches(track.category) {
            return false;
        }

        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        track.title.to_lowercase().contains(&needle)
            || track.artist.to_lowercase().contains(&needle)
            || track
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || track.category.as_str().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    Artist,
    #[default]
    AddedDate,
    Duration,
    Plays,
    Likes,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Title,
        SortKey::Artist,
        SortKey::AddedDate,
        SortKey::Duration,
        SortKey::Plays,
        SortKey::Likes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::AddedDate => "addedDate",
            Self::Duration => "duration",
            Self::Plays => "plays",
            Self::Likes => "likes",
        }
    }

    /// Ascending comparison for this key
    pub fn compare(self, a: &Track, b: &Track) -> Ordering {
        match self {
            Self::Title => caseless_cmp(&a.title, &b.title),
            Self::Artist => caseless_cmp(&a.artist, &b.artist),
            Self::AddedDate => a.added_at.cmp(&b.added_at),
            Self::Duration => a.duration_seconds.total_cmp(&b.duration_seconds),
            Self::Plays => a.plays.cmp(&b.plays),
            Self::Likes => a.likes.cmp(&b.likes),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("unknown sort order: {s}")),
        }
    }
}

/// Filter then stable-sort
///
/// Equal keys keep their input order in both directions.
pub fn filter_sort<'a>(
    tracks: &'a [Track],
    filter: &TrackFilter,
    key: SortKey,
    order: SortOrder,
) -> Vec<&'a Track> {
    let mut out: Vec<&Track> = tracks.iter().filter(|t| filter.matches(t)).collect();

    match order {
        SortOrder::Asc => out.sort_by(|a, b| key.compare(a, b)),
        SortOrder::Desc => out.sort_by(|a, b| key.compare(b, a)),
    }
    out
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
