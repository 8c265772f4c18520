//! Machine-readable result record
//!
//! Flat record the CLI layer emits as JSON. Floats are rounded to a fixed
//! precision for reproducible output, `-0.0` is normalized to `0.0`, and
//! non-finite values serialize as the literal strings `"-inf"` / `"inf"`
//! (serde_json would otherwise turn them into null). The record is built
//! as a `serde_json::Map` directly so that rule is applied in one place.

use crate::compliance::CompliancePlan;
use crate::decision::ApplyDecision;
use crate::gain::GainPlan;
use crate::metrics::Measurement;
use serde_json::{Map, Value};

/// Schema tag stamped into every record.
pub const REPORT_SCHEMA: &str = "lufs.report.v1";

/// Decimal places kept on every float in the JSON output.
const REPORT_PRECISION: i32 = 3;

/// One file's analysis/normalization outcome, ready for JSON emission.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub file: String,
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub integrated_lufs: f64,
    pub peak_dbfs: f64,

    pub loudness_range_lu: Option<f64>,
    pub true_peak_dbtp: Option<f64>,
    pub momentary_max_lufs: Option<f64>,
    pub short_term_max_lufs: Option<f64>,

    // Cross-check of the two measurement paths
    pub integrated_lufs_reference: Option<f64>,
    pub integrated_lufs_other: Option<f64>,
    pub delta: Option<f64>,

    // Target mode
    pub target_lufs: Option<f64>,
    pub tolerance_lu: Option<f64>,
    pub delta_lu: Option<f64>,
    pub status: Option<&'static str>,
    pub suggested_gain_db: Option<f64>,

    // Apply mode
    pub applied_gain_db: Option<f64>,
    pub predicted_peak_dbfs: Option<f64>,
    pub predicted_true_peak_dbtp: Option<f64>,
    pub true_peak_warning: bool,
    pub decision: Option<&'static str>,
    pub decision_reason: Option<&'static str>,
    pub output_path: Option<String>,
    pub dry_run: bool,
}

impl Report {
    /// Start a record from a completed measurement.
    pub fn from_measurement(
        file: impl Into<String>,
        sample_rate: u32,
        duration_seconds: f64,
        peak_dbfs: f64,
        measurement: &Measurement,
    ) -> Self {
        let metrics = measurement.metrics();
        let mut report = Self {
            file: file.into(),
            sample_rate,
            duration_seconds,
            integrated_lufs: metrics.integrated_lufs,
            peak_dbfs,
            loudness_range_lu: metrics.loudness_range_lu,
            true_peak_dbtp: metrics.true_peak_dbtp,
            momentary_max_lufs: metrics.momentary_max_lufs,
            short_term_max_lufs: metrics.short_term_max_lufs,
            ..Self::default()
        };

        if let Some(cmp) = measurement.comparison() {
            report.integrated_lufs_reference = Some(cmp.reference.integrated_lufs);
            report.integrated_lufs_other = Some(cmp.other.integrated_lufs);
            report.delta = Some(cmp.delta_lu);
        }

        report
    }

    /// Fold in the compliance verdict.
    pub fn with_compliance(mut self, plan: &CompliancePlan) -> Self {
        self.target_lufs = Some(plan.target_lufs);
        self.tolerance_lu = Some(plan.tolerance_lu);
        self.delta_lu = plan.delta_lu;
        self.status = Some(plan.verdict.as_str());
        self.suggested_gain_db = plan.suggested_gain_db;
        self
    }

    /// Fold in the planned gain.
    pub fn with_gain(mut self, gain: &GainPlan) -> Self {
        self.applied_gain_db = Some(gain.applied_gain_db);
        self.predicted_peak_dbfs = Some(gain.predicted_peak_dbfs);
        self.predicted_true_peak_dbtp = gain.predicted_true_peak_dbtp;
        self.true_peak_warning = gain.true_peak_exceeded;
        self
    }

    /// Fold in the terminal decision.
    pub fn with_decision(mut self, decision: &ApplyDecision) -> Self {
        self.decision = Some(decision.label());
        self.decision_reason = decision.reason();
        match decision {
            ApplyDecision::DryRunPlanned {
                path,
                true_peak_warning,
            } => {
                self.dry_run = true;
                self.true_peak_warning |= *true_peak_warning;
                self.output_path = Some(path.display().to_string());
            }
            ApplyDecision::Write(path) => {
                self.output_path = Some(path.display().to_string());
            }
            _ => {}
        }
        self
    }

    /// Build the JSON value with the fixed-precision float policy applied.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("schema".into(), Value::from(REPORT_SCHEMA));
        map.insert("file".into(), Value::from(self.file.clone()));
        map.insert("sample_rate".into(), Value::from(self.sample_rate));
        map.insert(
            "duration_seconds".into(),
            json_float(self.duration_seconds),
        );
        map.insert("integrated_lufs".into(), json_float(self.integrated_lufs));
        map.insert("peak_dbfs".into(), json_float(self.peak_dbfs));

        let optional_floats = [
            ("loudness_range_lu", self.loudness_range_lu),
            ("true_peak_dbtp", self.true_peak_dbtp),
            ("momentary_max_lufs", self.momentary_max_lufs),
            ("short_term_max_lufs", self.short_term_max_lufs),
            (
                "integrated_lufs_reference",
                self.integrated_lufs_reference,
            ),
            ("integrated_lufs_other", self.integrated_lufs_other),
            ("delta", self.delta),
            ("target_lufs", self.target_lufs),
            ("tolerance_lu", self.tolerance_lu),
            ("delta_lu", self.delta_lu),
            ("suggested_gain_db", self.suggested_gain_db),
            ("applied_gain_db", self.applied_gain_db),
            ("predicted_peak_dbfs", self.predicted_peak_dbfs),
            (
                "predicted_true_peak_dbtp",
                self.predicted_true_peak_dbtp,
            ),
        ];
        for (key, value) in optional_floats {
            if let Some(v) = value {
                map.insert(key.into(), json_float(v));
            }
        }

        if let Some(status) = self.status {
            map.insert("status".into(), Value::from(status));
        }
        if let Some(decision) = self.decision {
            map.insert("decision".into(), Value::from(decision));
            map.insert("dry_run".into(), Value::from(self.dry_run));
            map.insert(
                "true_peak_warning".into(),
                Value::from(self.true_peak_warning),
            );
        }
        if let Some(reason) = self.decision_reason {
            map.insert("decision_reason".into(), Value::from(reason));
        }
        if let Some(path) = &self.output_path {
            map.insert("output_path".into(), Value::from(path.clone()));
        }

        Value::Object(map)
    }

    /// Serialize to a JSON string; `pretty` adds indentation.
    pub fn to_json(&self, pretty: bool) -> String {
        let value = self.to_value();
        if pretty {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| String::from("{}"))
        } else {
            serde_json::to_string(&value).unwrap_or_else(|_| String::from("{}"))
        }
    }
}

/// Encode one float under the report policy: non-finite values become
/// `"-inf"` / `"inf"` strings, everything else is rounded and `-0.0`
/// normalized away.
fn json_float(v: f64) -> Value {
    if v.is_nan() {
        // NaN should never reach a report; it encodes as "inf" (NaN is
        // not negative) rather than null
        tracing::warn!("NaN reached report serialization");
        return Value::from("inf");
    }
    if v == f64::NEG_INFINITY {
        return Value::from("-inf");
    }
    if v == f64::INFINITY {
        return Value::from("inf");
    }

    let scale = 10_f64.powi(REPORT_PRECISION);
    let mut rounded = (v * scale).round() / scale;
    if rounded == 0.0 {
        rounded = 0.0; // fold -0.0 into 0.0
    }
    Value::from(rounded)
}
