//! Audio and cover file probing
//!
//! Duration comes from the audio properties lofty reads; MIME types are
//! guessed from the file extension.

use crate::error::{CliError, Result};
use cadenza_core::types::MediaRef;
use lofty::AudioFile;
use std::path::Path;

/// Duration and payload reference for an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedAudio {
    pub duration_seconds: f64,
    pub media: MediaRef,
}

/// Read duration, size and MIME type of an audio file
pub fn probe_audio(path: &Path) -> Result<ProbedAudio> {
    let media = media_ref(path)?;

    let tagged_file = lofty::read_from_path(path).map_err(|e| CliError::Probe {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let duration_seconds = tagged_file.properties().duration().as_secs_f64();

    Ok(ProbedAudio {
        duration_seconds,
        media,
    })
}

/// Payload reference for any file: absolute uri, size and guessed MIME type
pub fn media_ref(path: &Path) -> Result<MediaRef> {
    let metadata = std::fs::metadata(path)?;
    let uri = std::fs::canonicalize(path)?;

    Ok(MediaRef::new(
        uri.display().to_string(),
        metadata.len(),
        guess_mime(path),
    ))
}

/// MIME type from the extension, using the names the validator accepts
pub fn guess_mime(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("m4a") => "audio/x-m4a".to_string(),
        Some("wav") => "audio/wav".to_string(),
        Some("mp3") => "audio/mpeg".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}
