//! Folder scanning and output naming

use crate::error::{AudioError, Result};
use std::path::{Path, PathBuf};

/// Input extensions the toolkit accepts (lowercase, no leading dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["wav", "flac", "ogg", "aiff", "aif"];

/// Prefix stamped onto every rendered output file.
///
/// Batch runs skip inputs already carrying it, and it keeps concurrent
/// writers from ever targeting the same output path.
pub const OUTPUT_PREFIX: &str = "targeted_";

/// Prefix for peak-normalised outputs, kept distinct so the two render
/// modes never collide and each batch mode can skip its own outputs.
pub const PEAK_OUTPUT_PREFIX: &str = "normalized_";

/// Sorted list of supported audio files directly inside `folder`.
///
/// Non-recursive; directories and unsupported extensions are skipped.
pub fn list_audio_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|source| AudioError::Scan {
        folder: folder.display().to_string(),
        source,
    })?;

    let mut audio_files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AudioError::Scan {
            folder: folder.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            audio_files.push(path);
        }
    }

    audio_files.sort();
    Ok(audio_files)
}

/// Whether the path carries a supported audio extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the file name marks an already-rendered output.
pub fn is_rendered_output(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(OUTPUT_PREFIX))
}

/// Default output path for an input: `targeted_<stem>.wav` next to it.
pub fn default_output_path(input: &Path) -> PathBuf {
    prefixed_output_path(input, OUTPUT_PREFIX)
}

/// Whether the file name marks a peak-normalised output.
pub fn is_peak_output(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PEAK_OUTPUT_PREFIX))
}

/// Default peak-normalised output path: `normalized_<stem>.wav` next to
/// the input.
pub fn peak_output_path(input: &Path) -> PathBuf {
    prefixed_output_path(input, PEAK_OUTPUT_PREFIX)
}

fn prefixed_output_path(input: &Path, prefix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = format!("{prefix}{stem}.wav");
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}
