//! Apply/skip/abort decision state machine
//!
//! Decides what the caller should do with a planned gain, given user
//! policy. Pure: the caller supplies the output-existence fact and acts on
//! the returned value; nothing here touches the filesystem or prints.

use crate::compliance::CompliancePlan;
use crate::gain::GainPlan;
use std::fmt;
use std::path::{Path, PathBuf};

/// User policy flags for a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePolicy {
    /// Write even when already within tolerance
    pub force: bool,
    /// Write even when the predicted sample peak exceeds 0 dBFS
    pub allow_clip: bool,
    /// Replace an existing output file
    pub overwrite: bool,
    /// Report the plan without writing
    pub dry_run: bool,
}

/// Why a run ended without writing, without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Silence,
    WithinTolerance,
    OutputExists,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silence => "silence",
            Self::WithinTolerance => "within_tolerance",
            Self::OutputExists => "output_exists",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run was refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    PredictedClip,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PredictedClip => "predicted_clip",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one decision pass.
///
/// Built fresh per invocation, never mutated; the caller consumes it once
/// to decide whether to invoke the render collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyDecision {
    /// Nothing to do; a normal outcome, not an error
    Skip(SkipReason),
    /// Writing would be unsafe and the policy does not allow it
    Abort(AbortReason),
    /// Dry run: this is what would have been written
    DryRunPlanned {
        path: PathBuf,
        /// Predicted true peak exceeds the limit; surfaced as a warning,
        /// does not change the decision
        true_peak_warning: bool,
    },
    /// Render the output to this path
    Write(PathBuf),
}

impl ApplyDecision {
    /// Stable wire label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skip(_) => "skip",
            Self::Abort(_) => "abort",
            Self::DryRunPlanned { .. } => "dry_run",
            Self::Write(_) => "write",
        }
    }

    /// Skip/abort reason label, when one applies.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Skip(r) => Some(r.as_str()),
            Self::Abort(r) => Some(r.as_str()),
            _ => None,
        }
    }
}

/// Decide what to do with a planned gain.
///
/// The checks run in a fixed priority order and the first match is
/// terminal:
///
/// 1. silence -> skip, regardless of every flag
/// 2. already compliant and not forced -> skip
/// 3. predicted clip and clipping not allowed -> abort
/// 4. dry run -> report the planned write
/// 5. output exists and overwrite not allowed -> skip
/// 6. write
///
/// The ordering is load-bearing: a compliant silent signal must never be
/// reported as a clip risk, and a dry run must report what would happen
/// even when the real write would be blocked by an existing output.
pub fn decide(
    compliance: &CompliancePlan,
    gain: &GainPlan,
    policy: WritePolicy,
    output_exists: bool,
    output_path: &Path,
) -> ApplyDecision {
    if compliance.is_silent() {
        return ApplyDecision::Skip(SkipReason::Silence);
    }

    if compliance.within_tolerance() && !policy.force {
        return ApplyDecision::Skip(SkipReason::WithinTolerance);
    }

    if gain.clipping_predicted && !policy.allow_clip {
        return ApplyDecision::Abort(AbortReason::PredictedClip);
    }

    if policy.dry_run {
        return ApplyDecision::DryRunPlanned {
            path: output_path.to_path_buf(),
            true_peak_warning: gain.true_peak_exceeded,
        };
    }

    if output_exists && !policy.overwrite {
        return ApplyDecision::Skip(SkipReason::OutputExists);
    }

    ApplyDecision::Write(output_path.to_path_buf())
}
