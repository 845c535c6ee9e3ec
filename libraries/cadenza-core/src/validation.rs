//! Input validation policy
//!
//! Limits are expressed in characters for text and bytes for payloads.
//! Validation never mutates its input; callers trim before storing.

use crate::error::ValidationError;
use crate::types::{MediaRef, NewTrack, TrackUpdate};

pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_ARTIST_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// 10 MiB
pub const MAX_AUDIO_BYTES: u64 = 10 * 1024 * 1024;
/// 2 MiB
pub const MAX_COVER_BYTES: u64 = 2 * 1024 * 1024;

pub const AUDIO_MIME_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/ogg", "audio/x-m4a"];
pub const COVER_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Validate a draft before it becomes a track
pub fn validate_new_track(draft: &NewTrack) -> Result<(), ValidationError> {
    validate_required_text("title", &draft.title, MAX_TITLE_LEN)?;
    validate_required_text("artist", &draft.artist, MAX_ARTIST_LEN)?;
    if let Some(ref description) = draft.description {
        validate_optional_text("description", description, MAX_DESCRIPTION_LEN)?;
    }
    validate_duration(draft.duration_seconds)?;

    let audio = draft.audio.as_ref().ok_or(ValidationError::Required {
        field: "audio file",
    })?;
    validate_audio(audio)?;

    if let Some(ref cover) = draft.cover {
        validate_cover(cover)?;
    }
    if let Some(ref color) = draft.accent_color {
        validate_accent_color(color)?;
    }
    Ok(())
}

/// Validate only the fields an edit actually sets
pub fn validate_update(update: &TrackUpdate) -> Result<(), ValidationError> {
    if let Some(ref title) = update.title {
        validate_required_text("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(ref artist) = update.artist {
        validate_required_text("artist", artist, MAX_ARTIST_LEN)?;
    }
    if let Some(Some(ref description)) = update.description {
        validate_optional_text("description", description, MAX_DESCRIPTION_LEN)?;
    }
    if let Some(Some(ref cover)) = update.cover {
        validate_cover(cover)?;
    }
    if let Some(Some(ref color)) = update.accent_color {
        validate_accent_color(color)?;
    }
    Ok(())
}

pub fn validate_audio(audio: &MediaRef) -> Result<(), ValidationError> {
    validate_media("audio file", audio, MAX_AUDIO_BYTES, AUDIO_MIME_TYPES)
}

pub fn validate_cover(cover: &MediaRef) -> Result<(), ValidationError> {
    validate_media("cover image", cover, MAX_COVER_BYTES, COVER_MIME_TYPES)
}

/// Playlist names follow the title limits
pub fn validate_playlist_name(name: &str) -> Result<(), ValidationError> {
    validate_required_text("playlist name", name, MAX_TITLE_LEN)
}

/// Accept `#rrggbb` hex colors only
pub fn validate_accent_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}

fn validate_required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    validate_optional_text(field, value, max)
}

fn validate_optional_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.trim().chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

fn validate_duration(seconds: f64) -> Result<(), ValidationError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidDuration(seconds))
    }
}

fn validate_media(
    field: &'static str,
    media: &MediaRef,
    max_bytes: u64,
    accepted: &[&str],
) -> Result<(), ValidationError> {
    if media.uri.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    if media.size_bytes > max_bytes {
        return Err(ValidationError::FileTooLarge {
            field,
            max_bytes,
            actual_bytes: media.size_bytes,
        });
    }
    let mime = media.mime_type.to_ascii_lowercase();
    if !accepted.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedMimeType {
            field,
            mime_type: media.mime_type.clone(),
        });
    }
    Ok(())
}
