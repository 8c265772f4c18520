//! Property-based tests for the engine invariants
//!
//! Uses proptest to verify the compliance, gain and decision guarantees
//! across many random inputs.

use lufs_engine::{
    decide, evaluate, parse_meter_log, ApplyDecision, GainPlanner, SkipReason, Verdict,
    WritePolicy,
};
use proptest::prelude::*;
use std::path::Path;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Compliance is symmetric around the target for equal |offset|.
    #[test]
    fn tolerance_is_symmetric(
        target in -60.0_f64..0.0,
        offset in 0.0_f64..30.0,
        tolerance in 0.0_f64..6.0,
    ) {
        let above = evaluate(target + offset, target, tolerance);
        let below = evaluate(target - offset, target, tolerance);
        prop_assert_eq!(above.within_tolerance(), below.within_tolerance());
    }

    /// Clamping is idempotent.
    #[test]
    fn clamp_is_idempotent(
        gain in -100.0_f64..100.0,
        lo in -48.0_f64..0.0,
        hi in 0.0_f64..48.0,
    ) {
        let once = gain.clamp(lo, hi);
        prop_assert_eq!(once.clamp(lo, hi), once);
    }

    /// Applied gain never leaves the configured bounds, however extreme
    /// the loudness delta.
    #[test]
    fn applied_gain_stays_in_bounds(
        measured in -120.0_f64..20.0,
        target in -60.0_f64..0.0,
        lo in -48.0_f64..-1.0,
        hi in 1.0_f64..48.0,
        peak in -60.0_f64..0.0,
    ) {
        let planner = GainPlanner::new(lo, hi, -1.0).unwrap();
        let plan = planner.plan(measured, target, peak, None);
        prop_assert!(plan.applied_gain_db >= lo);
        prop_assert!(plan.applied_gain_db <= hi);
    }

    /// Silence always skips, regardless of the policy flags.
    #[test]
    fn silence_always_skips(
        force in any::<bool>(),
        allow_clip in any::<bool>(),
        overwrite in any::<bool>(),
        dry_run in any::<bool>(),
        output_exists in any::<bool>(),
    ) {
        let compliance = evaluate(f64::NEG_INFINITY, -14.0, 0.5);
        let gain = GainPlanner::new(-24.0, 12.0, -1.0)
            .unwrap()
            .plan(-14.0, -14.0, f64::NEG_INFINITY, None);
        let policy = WritePolicy { force, allow_clip, overwrite, dry_run };
        let decision = decide(&compliance, &gain, policy, output_exists, Path::new("o.wav"));
        prop_assert_eq!(decision, ApplyDecision::Skip(SkipReason::Silence));
    }

    /// A dry run never produces a Write decision.
    #[test]
    fn dry_run_never_writes(
        measured in -60.0_f64..0.0,
        target in -30.0_f64..-5.0,
        peak in -30.0_f64..0.0,
        force in any::<bool>(),
        allow_clip in any::<bool>(),
        overwrite in any::<bool>(),
        output_exists in any::<bool>(),
    ) {
        let compliance = evaluate(measured, target, 0.5);
        let gain = GainPlanner::new(-24.0, 12.0, -1.0)
            .unwrap()
            .plan(measured, target, peak, None);
        let policy = WritePolicy { force, allow_clip, overwrite, dry_run: true };
        let decision = decide(&compliance, &gain, policy, output_exists, Path::new("o.wav"));
        prop_assert!(!matches!(decision, ApplyDecision::Write(_)));
    }

    /// Non-dry-run with a fresh output path and no clip risk always writes
    /// when there is an actual correction to make.
    #[test]
    fn clean_path_always_writes(
        target in -30.0_f64..-10.0,
        excess in 1.0_f64..10.0,
    ) {
        // louder than target by more than the tolerance, quiet peak
        let measured = target + excess;
        let compliance = evaluate(measured, target, 0.5);
        let gain = GainPlanner::new(-24.0, 12.0, -1.0)
            .unwrap()
            .plan(measured, target, -30.0, None);
        prop_assert!(!gain.clipping_predicted);
        let decision = decide(
            &compliance,
            &gain,
            WritePolicy::default(),
            false,
            Path::new("o.wav"),
        );
        prop_assert!(matches!(decision, ApplyDecision::Write(_)));
    }

    /// Inverted bounds are always refused at construction, never allowed
    /// to reach the clamp.
    #[test]
    fn inverted_bounds_never_build_a_planner(
        lo in 0.1_f64..48.0,
        hi in -48.0_f64..-0.1,
    ) {
        prop_assert!(GainPlanner::new(lo, hi, -1.0).is_err());
    }

    /// Verdict agrees with the sign of the out-of-tolerance delta.
    #[test]
    fn verdict_matches_delta_sign(
        target in -40.0_f64..-5.0,
        delta in -20.0_f64..20.0,
        tolerance in 0.0_f64..3.0,
    ) {
        let plan = evaluate(target + delta, target, tolerance);
        let expected = if delta.abs() <= tolerance {
            Verdict::Compliant
        } else if delta > 0.0 {
            Verdict::TooLoud
        } else {
            Verdict::TooQuiet
        };
        prop_assert_eq!(plan.verdict, expected);
    }

    /// Running-meter values at or below the -70 LUFS floor never reach the
    /// momentary/short-term maxima.
    #[test]
    fn floor_values_never_contribute(
        floor_value in -200.0_f64..=-70.0,
        live_value in -69.9_f64..-5.0,
    ) {
        let log = format!(
            "M: {floor_value:.1} S: {floor_value:.1} I: -20.0 LUFS\n\
             M: {live_value:.1} S: {live_value:.1} I: -20.0 LUFS\n"
        );
        let metrics = parse_meter_log(&log).unwrap();
        let expected: f64 = format!("{live_value:.1}").parse().unwrap();
        prop_assert_eq!(metrics.momentary_max_lufs, Some(expected));
        prop_assert_eq!(metrics.short_term_max_lufs, Some(expected));
    }
}
