//! Embedded integrated-loudness primitive
//!
//! The engine never measures loudness itself; it is handed an
//! [`IntegratedLoudnessMeter`] capability. The shipped implementation wraps
//! the `ebur128` crate in single-shot mode, which is all the windowed
//! estimator needs.

use crate::error::{EngineError, Result};
use ebur128::{EbuR128, Mode};

/// Capability interface for a single-shot ITU-R BS.1770 measurement.
///
/// A silent buffer measures `-inf`; that is a first-class outcome, not an
/// error. Implementations must never return NaN.
pub trait IntegratedLoudnessMeter {
    /// Measure the integrated loudness of a mono buffer in LUFS.
    fn measure(&self, samples: &[f32], sample_rate: u32) -> Result<f64>;
}

/// `ebur128`-backed meter over a mono reference channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct EbuR128Meter;

impl EbuR128Meter {
    pub fn new() -> Self {
        Self
    }
}

impl IntegratedLoudnessMeter for EbuR128Meter {
    fn measure(&self, samples: &[f32], sample_rate: u32) -> Result<f64> {
        if !(8000..=384000).contains(&sample_rate) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }

        let mut state = EbuR128::new(1, sample_rate, Mode::I)?;
        state.add_frames_f32(samples)?;
        let lufs = state.loudness_global()?;

        // ebur128 reports -inf for silence; NaN must not leak to callers.
        if lufs.is_nan() {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(lufs)
    }
}

/// Convert a linear amplitude to decibels; zero and below map to `-inf`.
pub fn db_from_linear(x: f64) -> f64 {
    if x <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * x.log10()
    }
}

/// Convert decibels to a linear multiplier.
pub fn linear_from_db(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Sample peak of a buffer in dBFS; empty or all-zero buffers are `-inf`.
pub fn sample_peak_dbfs(samples: &[f32]) -> f64 {
    let peak = samples
        .iter()
        .fold(0.0_f32, |acc, s| acc.max(s.abs()));
    db_from_linear(f64::from(peak))
}
