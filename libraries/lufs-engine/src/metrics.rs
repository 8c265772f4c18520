//! Measurement data model
//!
//! One measurement pass produces a [`LoudnessMetrics`]; the engine can run
//! the embedded meter, the external tool, or both. [`Measurement`] unifies
//! the three shapes so downstream code pattern-matches instead of probing
//! optional fields.

use std::fmt;

/// What the measurement actually looked at.
///
/// The external tool reads the whole file; the embedded path measures the
/// decoded mono mixdown. The two differ numerically, so results carry a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementBasis {
    /// Measured from the original file, all channels
    WholeFile,
    /// Measured from the decoded, mono-summed sample buffer
    MonoMixdown,
}

impl MeasurementBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeFile => "whole_file",
            Self::MonoMixdown => "mono_mixdown",
        }
    }
}

/// Raw output of one measurement pass.
///
/// Invariant: every present value is finite or exactly `-inf` (silence);
/// NaN is never surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessMetrics {
    /// Integrated loudness in LUFS; `-inf` for silence
    pub integrated_lufs: f64,

    /// Loudness range in LU, when the meter reported one
    pub loudness_range_lu: Option<f64>,

    /// Maximum momentary loudness (0.4 s window) in LUFS
    pub momentary_max_lufs: Option<f64>,

    /// Maximum short-term loudness (3.0 s window) in LUFS
    pub short_term_max_lufs: Option<f64>,

    /// True peak in dBTP, when the meter reported one
    pub true_peak_dbtp: Option<f64>,

    /// What the numbers were measured from
    pub basis: MeasurementBasis,
}

impl LoudnessMetrics {
    /// A metrics record carrying only an integrated value.
    pub fn integrated_only(integrated_lufs: f64, basis: MeasurementBasis) -> Self {
        Self {
            integrated_lufs,
            loudness_range_lu: None,
            momentary_max_lufs: None,
            short_term_max_lufs: None,
            true_peak_dbtp: None,
            basis,
        }
    }

    /// True when the measured signal carried no loudness at all.
    pub fn is_silent(&self) -> bool {
        self.integrated_lufs == f64::NEG_INFINITY
    }
}

impl fmt::Display for LoudnessMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_silent() {
            write!(f, "Loudness: -inf (silence)")
        } else {
            write!(f, "Loudness: {:.2} LUFS", self.integrated_lufs)?;
            if let Some(lra) = self.loudness_range_lu {
                write!(f, ", Range: {:.2} LU", lra)?;
            }
            if let Some(tp) = self.true_peak_dbtp {
                write!(f, ", True Peak: {:.2} dBTP", tp)?;
            }
            Ok(())
        }
    }
}

/// Two independent measurement paths of the same input, plus their delta.
///
/// The reference side is always the external-tool measurement when both
/// paths are available.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Reference measurement (external tool)
    pub reference: LoudnessMetrics,
    /// The other measurement (embedded meter)
    pub other: LoudnessMetrics,
    /// `reference.integrated_lufs - other.integrated_lufs`
    pub delta_lu: f64,
}

impl Comparison {
    pub fn new(reference: LoudnessMetrics, other: LoudnessMetrics) -> Self {
        let delta_lu = reference.integrated_lufs - other.integrated_lufs;
        Self {
            reference,
            other,
            delta_lu,
        }
    }
}

/// A completed measurement, tagged by which path(s) produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Embedded BS.1770 meter only
    Embedded(LoudnessMetrics),
    /// External metering tool only
    External(LoudnessMetrics),
    /// Both paths, cross-checked; the external side is authoritative
    Compared(Comparison),
}

impl Measurement {
    /// The authoritative metrics for downstream compliance/gain work.
    pub fn metrics(&self) -> &LoudnessMetrics {
        match self {
            Self::Embedded(m) | Self::External(m) => m,
            Self::Compared(c) => &c.reference,
        }
    }

    /// Authoritative integrated loudness in LUFS (`-inf` for silence).
    pub fn integrated_lufs(&self) -> f64 {
        self.metrics().integrated_lufs
    }

    pub fn is_silent(&self) -> bool {
        self.metrics().is_silent()
    }

    /// The cross-check, when one was performed.
    pub fn comparison(&self) -> Option<&Comparison> {
        match self {
            Self::Compared(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(lufs: f64) -> LoudnessMetrics {
        LoudnessMetrics::integrated_only(lufs, MeasurementBasis::WholeFile)
    }

    #[test]
    fn test_silence_flag() {
        assert!(metrics(f64::NEG_INFINITY).is_silent());
        assert!(!metrics(-14.0).is_silent());
    }

    #[test]
    fn test_comparison_delta() {
        let reference = metrics(-13.8);
        let other = LoudnessMetrics::integrated_only(-14.1, MeasurementBasis::MonoMixdown);
        let cmp = Comparison::new(reference, other);
        assert!((cmp.delta_lu - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_compared_reference_is_authoritative() {
        let reference = metrics(-13.8);
        let other = LoudnessMetrics::integrated_only(-14.1, MeasurementBasis::MonoMixdown);
        let m = Measurement::Compared(Comparison::new(reference, other));
        assert!((m.integrated_lufs() - (-13.8)).abs() < 1e-9);
    }

    #[test]
    fn test_display_silence() {
        assert_eq!(
            metrics(f64::NEG_INFINITY).to_string(),
            "Loudness: -inf (silence)"
        );
    }
}
