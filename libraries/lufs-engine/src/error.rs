//! Error types for the loudness engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during loudness measurement and planning
#[derive(Error, Debug)]
pub enum EngineError {
    /// No integrated loudness could be recovered from the meter log.
    ///
    /// This is the only fatal parse condition; every other metric
    /// degrades to "absent" instead of failing.
    #[error("could not recover an integrated LUFS value from the meter output")]
    MissingIntegrated,

    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Gain bounds that cannot form a clamp range
    #[error("invalid gain bounds: min {min} dB and max {max} dB must be finite with min <= max")]
    InvalidGainBounds { min: f64, max: f64 },

    /// EBU R128 analysis error
    #[error("EBU R128 analysis failed: {0}")]
    Analysis(String),
}

impl From<ebur128::Error> for EngineError {
    fn from(err: ebur128::Error) -> Self {
        Self::Analysis(format!("{:?}", err))
    }
}
