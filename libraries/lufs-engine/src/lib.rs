//! Loudness measurement and gain-decision engine
//!
//! This crate measures the perceptual loudness of an audio signal, compares
//! it against a target, and computes a safe, clamped gain move — without
//! ever touching samples or the filesystem itself. It supports two
//! measurement paths that can be cross-checked against each other:
//!
//! - an embedded ITU-R BS.1770 meter (the `ebur128` crate behind the
//!   [`IntegratedLoudnessMeter`] trait), with windowed momentary /
//!   short-term maxima approximated by [`windowed_loudness_max`]
//! - an external metering tool whose diagnostic text is parsed by
//!   [`parse_meter_log`]
//!
//! # Pipeline
//!
//! ```text
//! samples / meter log
//!        │
//!        ▼
//! ┌──────────────┐    ┌────────────┐    ┌─────────────┐    ┌───────────────┐
//! │ Measurement  │ ─► │ evaluate() │ ─► │ GainPlanner │ ─► │   decide()    │
//! └──────────────┘    └────────────┘    └─────────────┘    └───────────────┘
//!                                                                 │
//!                                        skip / abort / dry-run / write
//! ```
//!
//! Every step is a deterministic function from inputs to outputs; blocking
//! work (decoding, subprocess invocation, file writes) belongs to the
//! callers.
//!
//! # Example
//!
//! ```
//! use lufs_engine::{decide, evaluate, GainPlanner, WritePolicy};
//! use std::path::Path;
//!
//! # fn main() -> lufs_engine::Result<()> {
//! let compliance = evaluate(-12.0, -14.0, 0.5);
//! let planner = GainPlanner::new(-24.0, 12.0, -1.0)?;
//! let gain = planner.plan(-12.0, -14.0, -6.0, None);
//! let decision = decide(
//!     &compliance,
//!     &gain,
//!     WritePolicy::default(),
//!     false,
//!     Path::new("targeted_mix.wav"),
//! );
//! # Ok(())
//! # }
//! ```

mod compliance;
mod decision;
mod error;
mod gain;
mod meter;
mod metrics;
mod parser;
mod report;
mod windowed;

pub use compliance::{evaluate, CompliancePlan, Verdict};
pub use decision::{decide, AbortReason, ApplyDecision, SkipReason, WritePolicy};
pub use error::{EngineError, Result};
pub use gain::{GainPlan, GainPlanner};
pub use meter::{
    db_from_linear, linear_from_db, sample_peak_dbfs, EbuR128Meter, IntegratedLoudnessMeter,
};
pub use metrics::{Comparison, LoudnessMetrics, Measurement, MeasurementBasis};
pub use parser::{parse_meter_log, LOUDNESS_FLOOR_LUFS};
pub use report::{Report, REPORT_SCHEMA};
pub use windowed::{windowed_loudness_max, WindowSpec};

/// Streaming-platform reference level, the usual normalization target
pub const STREAMING_TARGET_LUFS: f64 = -14.0;

/// Default compliance tolerance in LU
pub const DEFAULT_TOLERANCE_LU: f64 = 0.5;

/// Default true-peak warning limit in dBTP
pub const DEFAULT_TRUE_PEAK_LIMIT_DBTP: f64 = -1.0;
