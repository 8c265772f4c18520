//! WAV rendering
//!
//! The engine plans gain in dB; the linear scaling happens here, at render
//! time, and nowhere else.

use crate::error::Result;
use std::path::Path;

/// Write a mono buffer as 32-bit float WAV, applying `gain_db` linearly.
pub fn write_wav_with_gain(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    gain_db: f64,
) -> Result<()> {
    let gain_linear = 10.0_f64.powf(gain_db / 20.0) as f32;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample * gain_linear)?;
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.display(),
        gain_db,
        frames = samples.len(),
        "rendered output"
    );

    Ok(())
}
