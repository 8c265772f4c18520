//! End-to-end engine scenarios
//!
//! Drives parse -> evaluate -> plan -> decide with concrete numbers and
//! checks the decision ordering guarantees.

use lufs_engine::{
    decide, evaluate, parse_meter_log, AbortReason, ApplyDecision, GainPlanner, Measurement,
    Report, SkipReason, Verdict, WindowSpec, WritePolicy,
};
use std::path::{Path, PathBuf};

fn planner() -> GainPlanner {
    GainPlanner::new(-24.0, 12.0, -1.0).unwrap()
}

fn out() -> PathBuf {
    PathBuf::from("targeted_mix.wav")
}

#[test]
fn already_on_target_round_trip() {
    let compliance = evaluate(-14.0, -14.0, 0.5);
    assert_eq!(compliance.verdict, Verdict::Compliant);
    assert_eq!(compliance.suggested_gain_db, Some(0.0));

    let decision = decide(
        &compliance,
        &planner().plan(-14.0, -14.0, -3.0, None),
        WritePolicy::default(),
        false,
        &out(),
    );
    assert_eq!(decision, ApplyDecision::Skip(SkipReason::WithinTolerance));
}

#[test]
fn slightly_hot_but_compliant() {
    let compliance = evaluate(-13.90, -14.00, 0.5);
    assert_eq!(compliance.verdict, Verdict::Compliant);
    assert!((compliance.delta_lu.unwrap() - 0.10).abs() < 1e-9);
    assert!((compliance.suggested_gain_db.unwrap() - (-0.10)).abs() < 1e-9);
}

#[test]
fn two_lu_hot_writes_a_cut() {
    let compliance = evaluate(-12.0, -14.0, 0.5);
    assert_eq!(compliance.verdict, Verdict::TooLoud);
    assert!((compliance.delta_lu.unwrap() - 2.0).abs() < 1e-9);

    let gain = planner().plan(-12.0, -14.0, -6.0, None);
    assert!((gain.applied_gain_db - (-2.0)).abs() < 1e-9);

    let decision = decide(&compliance, &gain, WritePolicy::default(), false, &out());
    assert_eq!(decision, ApplyDecision::Write(out()));
}

#[test]
fn sixteen_lu_quiet_clamps_to_max_gain() {
    let gain = planner().plan(-30.0, -14.0, -20.0, None);
    assert!((GainPlanner::raw_gain_db(-30.0, -14.0) - 16.0).abs() < 1e-9);
    assert!((gain.applied_gain_db - 12.0).abs() < 1e-9);
    // clamped gain leaves the file off target, by design
}

#[test]
fn predicted_clip_aborts_then_allow_clip_writes() {
    let compliance = evaluate(-16.0, -14.0, 0.5);
    let gain = planner().plan(-16.0, -14.0, -0.5, None);
    assert!((gain.predicted_peak_dbfs - 1.5).abs() < 1e-9);
    assert!(gain.clipping_predicted);

    let decision = decide(&compliance, &gain, WritePolicy::default(), false, &out());
    assert_eq!(decision, ApplyDecision::Abort(AbortReason::PredictedClip));

    let policy = WritePolicy {
        allow_clip: true,
        ..WritePolicy::default()
    };
    let decision = decide(&compliance, &gain, policy, false, &out());
    assert_eq!(decision, ApplyDecision::Write(out()));
}

#[test]
fn silent_compliant_signal_is_never_a_clip_risk() {
    // silence with an absurd gain plan must still report silence, not clip
    let compliance = evaluate(f64::NEG_INFINITY, -14.0, 0.5);
    let gain = planner().plan(-50.0, -14.0, 0.0, None);
    assert!(gain.clipping_predicted);

    let decision = decide(&compliance, &gain, WritePolicy::default(), false, &out());
    assert_eq!(decision, ApplyDecision::Skip(SkipReason::Silence));
}

#[test]
fn meter_log_to_decision() {
    let log = "\
[Parsed_ebur128_0 @ 0x1] t: 0.4  TARGET:-23 LUFS  M: nan S: nan  I: nan LUFS  LRA: nan LU
[Parsed_ebur128_0 @ 0x1] t: 1.0  TARGET:-23 LUFS  M: -11.2 S: -11.9  I: -11.8 LUFS  LRA: 0.4 LU
[Parsed_ebur128_0 @ 0x1] t: 2.0  TARGET:-23 LUFS  M: -10.8 S: -11.4  I: -11.6 LUFS  LRA: 0.5 LU
[Parsed_ebur128_0 @ 0x1] Summary:

  Integrated loudness:
    I:         -11.5 LUFS
    Threshold: -22.0 LUFS

  Loudness range:
    LRA:         0.5 LU

  True peak:
    TP:         -0.3 dBTP
";
    let metrics = parse_meter_log(log).unwrap();
    assert!((metrics.integrated_lufs - (-11.5)).abs() < 1e-9);
    assert_eq!(metrics.true_peak_dbtp, Some(-0.3));
    assert_eq!(metrics.momentary_max_lufs, Some(-10.8));

    let measurement = Measurement::External(metrics.clone());
    let compliance = evaluate(measurement.integrated_lufs(), -14.0, 0.5);
    assert_eq!(compliance.verdict, Verdict::TooLoud);

    let gain = planner().plan(
        measurement.integrated_lufs(),
        -14.0,
        -0.3,
        metrics.true_peak_dbtp,
    );
    // cutting by 2.5 dB: peak prediction well under 0 dBFS
    assert!((gain.applied_gain_db - (-2.5)).abs() < 1e-9);
    assert!(!gain.clipping_predicted);
    assert!((gain.predicted_true_peak_dbtp.unwrap() - (-2.8)).abs() < 1e-9);
    assert!(!gain.true_peak_exceeded);

    let decision = decide(&compliance, &gain, WritePolicy::default(), false, &out());
    assert_eq!(decision, ApplyDecision::Write(out()));

    let report = Report::from_measurement("mix.wav", 48000, 30.0, -0.3, &measurement)
        .with_compliance(&compliance)
        .with_gain(&gain)
        .with_decision(&decision)
        .to_value();
    assert_eq!(report["decision"], "write");
    assert_eq!(report["status"], "too_loud");
    assert_eq!(report["applied_gain_db"], -2.5);
    assert_eq!(report["output_path"], "targeted_mix.wav");
}

#[test]
fn window_specs_match_published_geometry() {
    assert!((WindowSpec::MOMENTARY.window_secs - 0.4).abs() < 1e-12);
    assert!((WindowSpec::MOMENTARY.step_secs - 0.1).abs() < 1e-12);
    assert!((WindowSpec::SHORT_TERM.window_secs - 3.0).abs() < 1e-12);
    assert!((WindowSpec::SHORT_TERM.step_secs - 0.5).abs() < 1e-12);
}

#[test]
fn decision_priority_table() {
    // one row per state, exercised through the same too-loud plan
    let compliance = evaluate(-16.0, -14.0, 0.5);
    let clean_gain = planner().plan(-16.0, -14.0, -6.0, None);
    let clip_gain = planner().plan(-16.0, -14.0, -0.5, None);
    let p = Path::new("o.wav");

    let cases: Vec<(ApplyDecision, ApplyDecision)> = vec![
        (
            decide(
                &evaluate(f64::NEG_INFINITY, -14.0, 0.5),
                &clean_gain,
                WritePolicy::default(),
                false,
                p,
            ),
            ApplyDecision::Skip(SkipReason::Silence),
        ),
        (
            decide(
                &evaluate(-14.0, -14.0, 0.5),
                &clean_gain,
                WritePolicy::default(),
                false,
                p,
            ),
            ApplyDecision::Skip(SkipReason::WithinTolerance),
        ),
        (
            decide(&compliance, &clip_gain, WritePolicy::default(), false, p),
            ApplyDecision::Abort(AbortReason::PredictedClip),
        ),
        (
            decide(
                &compliance,
                &clean_gain,
                WritePolicy {
                    dry_run: true,
                    ..WritePolicy::default()
                },
                true,
                p,
            ),
            ApplyDecision::DryRunPlanned {
                path: p.to_path_buf(),
                true_peak_warning: false,
            },
        ),
        (
            decide(&compliance, &clean_gain, WritePolicy::default(), true, p),
            ApplyDecision::Skip(SkipReason::OutputExists),
        ),
        (
            decide(&compliance, &clean_gain, WritePolicy::default(), false, p),
            ApplyDecision::Write(p.to_path_buf()),
        ),
    ];

    for (got, expected) in cases {
        assert_eq!(got, expected);
    }
}
