//! Gain planning
//!
//! Computes a bounded corrective gain from the loudness delta and predicts
//! the resulting peak levels. Gain stays in the dB domain here; the linear
//! scaling `10^(gain/20)` is applied only at render time by the writer.

use crate::error::{EngineError, Result};

/// A clamped gain decision with predicted output peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct GainPlan {
    /// Gain in dB after clamping to the configured bounds
    pub applied_gain_db: f64,
    /// Sample peak after gain, in dBFS
    pub predicted_peak_dbfs: f64,
    /// True peak after gain, in dBTP; absent when none was measured
    pub predicted_true_peak_dbtp: Option<f64>,
    /// Predicted sample peak exceeds 0 dBFS
    pub clipping_predicted: bool,
    /// Predicted true peak exceeds the configured limit
    pub true_peak_exceeded: bool,
}

/// Gain planner with required safety bounds.
///
/// There is deliberately no `Default`: the gain bounds are policy and must
/// come from the caller's configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPlanner {
    /// Lowest allowed gain change in dB
    pub min_gain_db: f64,
    /// Highest allowed gain change in dB
    pub max_gain_db: f64,
    /// Predicted true peaks above this dBTP raise `true_peak_exceeded`
    pub true_peak_limit_dbtp: f64,
}

impl GainPlanner {
    /// Build a planner, rejecting bounds that cannot form a clamp range.
    ///
    /// `min > max` or a non-finite bound would make the clamp in [`plan`]
    /// panic, so it is refused here instead of deep in a run.
    ///
    /// [`plan`]: GainPlanner::plan
    pub fn new(min_gain_db: f64, max_gain_db: f64, true_peak_limit_dbtp: f64) -> Result<Self> {
        if !min_gain_db.is_finite() || !max_gain_db.is_finite() || min_gain_db > max_gain_db {
            return Err(EngineError::InvalidGainBounds {
                min: min_gain_db,
                max: max_gain_db,
            });
        }
        Ok(Self {
            min_gain_db,
            max_gain_db,
            true_peak_limit_dbtp,
        })
    }

    /// The unclamped gain that would land exactly on target.
    pub fn raw_gain_db(measured_lufs: f64, target_lufs: f64) -> f64 {
        -(measured_lufs - target_lufs)
    }

    /// Plan a gain move from `measured_lufs` toward `target_lufs`.
    ///
    /// Clamping always wins over reaching the exact target; a clamped gain
    /// that leaves the signal off-target is the intended safety bound.
    /// Without a true-peak measurement the true-peak fields stay absent and
    /// `true_peak_exceeded` is false (cannot warn about what was not
    /// measured).
    pub fn plan(
        &self,
        measured_lufs: f64,
        target_lufs: f64,
        sample_peak_dbfs: f64,
        true_peak_dbtp: Option<f64>,
    ) -> GainPlan {
        let raw = Self::raw_gain_db(measured_lufs, target_lufs);
        let applied_gain_db = raw.clamp(self.min_gain_db, self.max_gain_db);

        let predicted_peak_dbfs = sample_peak_dbfs + applied_gain_db;
        let clipping_predicted = predicted_peak_dbfs > 0.0;

        let predicted_true_peak_dbtp = true_peak_dbtp.map(|tp| tp + applied_gain_db);
        let true_peak_exceeded =
            predicted_true_peak_dbtp.map_or(false, |tp| tp > self.true_peak_limit_dbtp);

        if clipping_predicted {
            tracing::debug!(
                applied_gain_db,
                predicted_peak_dbfs,
                "planned gain would clip"
            );
        }

        GainPlan {
            applied_gain_db,
            predicted_peak_dbfs,
            predicted_true_peak_dbtp,
            clipping_predicted,
            true_peak_exceeded,
        }
    }
}
