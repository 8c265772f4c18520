//! Audio I/O collaborators for the LUFS toolkit
//!
//! Everything the loudness engine deliberately does not do lives here:
//! decoding files to a mono sample buffer (Symphonia), rendering gained
//! output as WAV (hound), and scanning folders for supported inputs.

mod decoder;
mod error;
mod scan;
mod writer;

pub use decoder::{decode_mono, DecodedAudio};
pub use error::{AudioError, Result};
pub use scan::{
    default_output_path, is_peak_output, is_rendered_output, is_supported, list_audio_files,
    peak_output_path, ALLOWED_EXTENSIONS, OUTPUT_PREFIX, PEAK_OUTPUT_PREFIX,
};
pub use writer::write_wav_with_gain;
