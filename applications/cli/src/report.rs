//! Human-readable result printing
//!
//! Pure formatting over a completed [`Report`]; all output goes through the
//! returned string so tests can assert on it without capturing stdout.

use crate::pipeline::PeakOutcome;
use lufs_engine::Report;

fn fmt_lufs(v: f64) -> String {
    if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn push_line(out: &mut String, label: &str, value: impl AsRef<str>) {
    out.push_str(&format!("  {label:<22} {}\n", value.as_ref()));
}

/// Render one file's outcome as a short text block.
pub fn render(report: &Report, warnings: &[String]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", report.file));
    push_line(
        &mut out,
        "Duration",
        format!("{:.2} s @ {} Hz", report.duration_seconds, report.sample_rate),
    );
    push_line(
        &mut out,
        "Integrated",
        format!("{} LUFS", fmt_lufs(report.integrated_lufs)),
    );
    if let Some(lra) = report.loudness_range_lu {
        push_line(&mut out, "Loudness range", format!("{lra:.2} LU"));
    }
    if let Some(m) = report.momentary_max_lufs {
        push_line(&mut out, "Momentary max", format!("{} LUFS", fmt_lufs(m)));
    }
    if let Some(s) = report.short_term_max_lufs {
        push_line(&mut out, "Short-term max", format!("{} LUFS", fmt_lufs(s)));
    }
    push_line(
        &mut out,
        "Sample peak",
        format!("{} dBFS", fmt_lufs(report.peak_dbfs)),
    );
    if let Some(tp) = report.true_peak_dbtp {
        push_line(&mut out, "True peak", format!("{tp:.2} dBTP"));
    }

    if let (Some(reference), Some(other)) =
        (report.integrated_lufs_reference, report.integrated_lufs_other)
    {
        push_line(
            &mut out,
            "Cross-check",
            format!(
                "{} vs {} LUFS (delta {:+.2} LU)",
                fmt_lufs(reference),
                fmt_lufs(other),
                report.delta.unwrap_or(0.0)
            ),
        );
    }

    if let (Some(target), Some(status)) = (report.target_lufs, report.status) {
        let mut line = format!("{status} (target {target:.1} LUFS");
        if let Some(delta) = report.delta_lu {
            line.push_str(&format!(", delta {delta:+.2} LU"));
        }
        line.push(')');
        push_line(&mut out, "Status", line);
    }
    if let Some(gain) = report.suggested_gain_db {
        push_line(&mut out, "Suggested gain", format!("{gain:+.2} dB"));
    }

    if let Some(gain) = report.applied_gain_db {
        push_line(&mut out, "Planned gain", format!("{gain:+.2} dB"));
    }
    if let Some(peak) = report.predicted_peak_dbfs {
        push_line(&mut out, "Predicted peak", format!("{peak:+.2} dBFS"));
    }
    if let Some(tp) = report.predicted_true_peak_dbtp {
        push_line(&mut out, "Predicted true peak", format!("{tp:+.2} dBTP"));
    }

    if let Some(decision) = report.decision {
        let mut line = decision.to_string();
        if let Some(reason) = report.decision_reason {
            line.push_str(&format!(" ({reason})"));
        }
        if report.dry_run {
            line.push_str(" [dry run]");
        }
        push_line(&mut out, "Decision", line);
    }
    if let Some(path) = &report.output_path {
        push_line(&mut out, "Output", path);
    }

    if report.true_peak_warning {
        out.push_str("  WARNING: predicted true peak exceeds the configured limit\n");
    }
    for warning in warnings {
        out.push_str(&format!("  WARNING: {warning}\n"));
    }

    out
}

/// Render one peak-normalisation outcome as a short text block.
///
/// Peaks are shown as linear amplitudes, the domain the scaling works in.
pub fn render_peak(outcome: &PeakOutcome) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", outcome.file));
    push_line(
        &mut out,
        "Duration",
        format!(
            "{:.2} s @ {} Hz",
            outcome.duration_seconds, outcome.sample_rate
        ),
    );
    push_line(
        &mut out,
        "Original peak",
        format!("{:.4}", outcome.peak_before),
    );
    push_line(&mut out, "New peak", format!("{:.4}", outcome.peak_after));
    push_line(&mut out, "Applied gain", format!("{:+.2} dB", outcome.gain_db));
    if outcome.written {
        push_line(&mut out, "Output", outcome.output_path.display().to_string());
    } else {
        push_line(
            &mut out,
            "Output",
            format!("{} [dry run]", outcome.output_path.display()),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lufs_engine::{
        evaluate, LoudnessMetrics, Measurement, MeasurementBasis,
    };

    fn base_report() -> Report {
        let metrics = LoudnessMetrics {
            integrated_lufs: -16.2,
            loudness_range_lu: Some(4.1),
            momentary_max_lufs: None,
            short_term_max_lufs: None,
            true_peak_dbtp: Some(-2.3),
            basis: MeasurementBasis::WholeFile,
        };
        Report::from_measurement(
            "mix.wav",
            48000,
            12.5,
            -3.4,
            &Measurement::External(metrics),
        )
    }

    #[test]
    fn test_measurement_lines() {
        let text = render(&base_report(), &[]);
        assert!(text.starts_with("mix.wav\n"));
        assert!(text.contains("-16.20 LUFS"));
        assert!(text.contains("4.10 LU"));
        assert!(text.contains("-2.30 dBTP"));
        assert!(!text.contains("Status"));
    }

    #[test]
    fn test_status_and_warnings() {
        let report = base_report().with_compliance(&evaluate(-16.2, -14.0, 0.5));
        let warnings = vec!["Very short audio (1.20s). LUFS/LRA may be unreliable.".into()];
        let text = render(&report, &warnings);
        assert!(text.contains("too_quiet"));
        assert!(text.contains("Suggested gain"));
        assert!(text.contains("WARNING: Very short audio"));
    }

    #[test]
    fn test_peak_lines() {
        let outcome = PeakOutcome {
            file: "mix.wav".into(),
            sample_rate: 48000,
            duration_seconds: 4.0,
            peak_before: 0.5,
            peak_after: 0.9,
            gain_db: 5.1055,
            output_path: "normalized_mix.wav".into(),
            written: false,
        };
        let text = render_peak(&outcome);
        assert!(text.contains("0.5000"));
        assert!(text.contains("0.9000"));
        assert!(text.contains("+5.11 dB"));
        assert!(text.contains("[dry run]"));
    }

    #[test]
    fn test_silence_renders_inf() {
        let metrics = LoudnessMetrics::integrated_only(
            f64::NEG_INFINITY,
            MeasurementBasis::MonoMixdown,
        );
        let report = Report::from_measurement(
            "silent.wav",
            44100,
            2.0,
            f64::NEG_INFINITY,
            &Measurement::Embedded(metrics),
        );
        let text = render(&report, &[]);
        assert!(text.contains("-inf LUFS"));
        assert!(text.contains("-inf dBFS"));
    }
}
