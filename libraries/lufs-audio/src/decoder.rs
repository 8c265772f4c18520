//! Mono decode via Symphonia
//!
//! The loudness engine models a single reference channel, so everything is
//! decoded to a mono f32 buffer at the file's native sample rate. Channels
//! are averaged; samples are converted with symmetric scaling (divide by
//! 2^(N-1)) so the [-1.0, 1.0) range stays symmetric.

use crate::error::{AudioError, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded mono buffer plus its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Duration of the buffer in seconds; 0.0 for a zero sample rate.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / f64::from(self.sample_rate)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decode a whole file to mono at its native sample rate.
pub fn decode_mono(path: &Path) -> Result<DecodedAudio> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("Failed to probe file: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::NoAudioTrack(path.display().to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("Missing sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => mixdown_to_mono(&decoded, &mut samples),
            // Recoverable per Symphonia docs: skip the bad packet
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        }
    }

    tracing::debug!(
        path = %path.display(),
        sample_rate,
        frames = samples.len(),
        "decoded to mono"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Append the mono mixdown of one decoded buffer.
fn mixdown_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    let channels = decoded.spec().channels.count();

    match decoded {
        AudioBufferRef::F32(buf) => {
            // F32 audio can carry intersample overs; clamp like any other path
            mix_frames(buf, channels, out, |s| s.clamp(-1.0, 1.0));
        }
        AudioBufferRef::F64(buf) => {
            mix_frames(buf, channels, out, |s| (s as f32).clamp(-1.0, 1.0));
        }
        AudioBufferRef::S32(buf) => {
            mix_frames(buf, channels, out, |s| s as f32 / 2147483648.0);
        }
        AudioBufferRef::S16(buf) => {
            mix_frames(buf, channels, out, |s| s as f32 / 32768.0);
        }
        AudioBufferRef::S8(buf) => {
            mix_frames(buf, channels, out, |s| s as f32 / 128.0);
        }
        AudioBufferRef::S24(buf) => {
            mix_frames(buf, channels, out, |s| s.inner() as f32 / 8388608.0);
        }
        AudioBufferRef::U32(buf) => {
            mix_frames(buf, channels, out, |s| {
                (s as f32 / u32::MAX as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U16(buf) => {
            mix_frames(buf, channels, out, |s| {
                (s as f32 / u16::MAX as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U8(buf) => {
            mix_frames(buf, channels, out, |s| {
                (s as f32 / u8::MAX as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U24(buf) => {
            mix_frames(buf, channels, out, |s| {
                (s.inner() as f32 / 16777215.0) * 2.0 - 1.0
            });
        }
    }
}

/// Average all channels of each frame into one mono sample.
fn mix_frames<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    channels: usize,
    out: &mut Vec<f32>,
    normalize: F,
) where
    T: symphonia::core::sample::Sample + Copy,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    if channels == 0 {
        return;
    }

    out.reserve(frames);
    let scale = 1.0 / channels as f32;
    for i in 0..frames {
        let mut acc = 0.0_f32;
        for ch in 0..channels {
            acc += normalize(buf.chan(ch)[i]);
        }
        out.push(acc * scale);
    }
}
