//! Audio I/O errors

use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio I/O error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No decodable audio track in the container
    #[error("No audio tracks found in {0}")]
    NoAudioTrack(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    Decode(String),

    /// WAV encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// Folder scan error
    #[error("Could not read folder '{folder}': {source}")]
    Scan {
        folder: String,
        source: std::io::Error,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        Self::Encode(err.to_string())
    }
}
