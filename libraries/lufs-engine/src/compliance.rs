//! Target-loudness compliance evaluation

use std::fmt;

/// Outcome of comparing a measurement against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Within the tolerance band (boundary inclusive)
    Compliant,
    /// Above target by more than the tolerance
    TooLoud,
    /// Below target by more than the tolerance
    TooQuiet,
    /// Measured loudness was -inf; no delta or gain applies
    Silent,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "within_tolerance",
            Self::TooLoud => "too_loud",
            Self::TooQuiet => "too_quiet",
            Self::Silent => "silent",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compliance verdict plus the numbers behind it.
///
/// `suggested_gain_db` is informational and unclamped; the gain planner
/// applies the configured bounds before anything is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct CompliancePlan {
    pub target_lufs: f64,
    pub tolerance_lu: f64,
    pub verdict: Verdict,
    /// `measured - target`; absent for silence
    pub delta_lu: Option<f64>,
    /// `-delta_lu`; absent for silence
    pub suggested_gain_db: Option<f64>,
}

impl CompliancePlan {
    pub fn within_tolerance(&self) -> bool {
        self.verdict == Verdict::Compliant
    }

    pub fn is_silent(&self) -> bool {
        self.verdict == Verdict::Silent
    }
}

/// Compare a measured integrated loudness against a target.
///
/// Silence (`-inf`) short-circuits to [`Verdict::Silent`] before any delta
/// is computed. The tolerance boundary is inclusive: a delta of exactly
/// `tolerance_lu` counts as compliant.
pub fn evaluate(measured_lufs: f64, target_lufs: f64, tolerance_lu: f64) -> CompliancePlan {
    if measured_lufs == f64::NEG_INFINITY {
        return CompliancePlan {
            target_lufs,
            tolerance_lu,
            verdict: Verdict::Silent,
            delta_lu: None,
            suggested_gain_db: None,
        };
    }

    let delta_lu = measured_lufs - target_lufs;
    let verdict = if delta_lu.abs() <= tolerance_lu {
        Verdict::Compliant
    } else if delta_lu > tolerance_lu {
        Verdict::TooLoud
    } else {
        Verdict::TooQuiet
    };

    CompliancePlan {
        target_lufs,
        tolerance_lu,
        verdict,
        delta_lu: Some(delta_lu),
        suggested_gain_db: Some(-delta_lu),
    }
}
