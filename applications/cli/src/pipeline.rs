//! Per-file measurement and normalization glue
//!
//! Sequential plumbing around the engine: decode, pick measurement
//! path(s), evaluate, plan, decide, render. Batch runs call the same
//! per-file entry points and carry no shared state.

use crate::ffmpeg;
use anyhow::{bail, Context};
use lufs_audio::{
    decode_mono, default_output_path, is_peak_output, is_rendered_output, list_audio_files,
    peak_output_path, write_wav_with_gain, DecodedAudio,
};
use lufs_engine::{
    db_from_linear, decide, evaluate, linear_from_db, sample_peak_dbfs, windowed_loudness_max,
    ApplyDecision, Comparison, EbuR128Meter, GainPlanner, IntegratedLoudnessMeter,
    LoudnessMetrics, Measurement, MeasurementBasis, Report, WindowSpec, WritePolicy,
};
use std::path::{Path, PathBuf};

/// Which measurement path drives a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MeterEngine {
    /// In-process BS.1770 meter over the decoded mono buffer
    Embedded,
    /// External ffmpeg `ebur128` filter over the original file
    External,
}

/// Inputs shorter than this carry an unreliable-measurement warning.
const SHORT_AUDIO_SECS: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct AnalyseOptions {
    pub engine: MeterEngine,
    pub compare: bool,
    pub target_lufs: Option<f64>,
    pub tolerance_lu: f64,
}

#[derive(Debug, Clone)]
pub struct NormaliseOptions {
    pub compare: bool,
    pub target_lufs: f64,
    pub tolerance_lu: f64,
    pub output: Option<PathBuf>,
    pub min_gain_db: f64,
    pub max_gain_db: f64,
    pub true_peak_limit_dbtp: f64,
    pub policy: WritePolicy,
}

/// One file's completed run, ready for reporting.
#[derive(Debug)]
pub struct FileOutcome {
    pub report: Report,
    pub short_audio_warning: Option<String>,
    /// Process exit code this outcome maps to (aborts are 1)
    pub exit_code: i32,
}

fn load(path: &Path) -> anyhow::Result<DecodedAudio> {
    let audio = decode_mono(path).with_context(|| format!("loading '{}'", path.display()))?;
    if audio.is_empty() {
        bail!("'{}' contains no samples", path.display());
    }
    Ok(audio)
}

fn short_audio_warning(duration: f64) -> Option<String> {
    (duration < SHORT_AUDIO_SECS).then(|| {
        format!("Very short audio ({duration:.2}s). LUFS/LRA may be unreliable.")
    })
}

fn silent_metrics(basis: MeasurementBasis) -> LoudnessMetrics {
    LoudnessMetrics::integrated_only(f64::NEG_INFINITY, basis)
}

/// Measure the decoded buffer with the embedded meter.
///
/// Windowed momentary/short-term maxima are only swept in compare mode,
/// where they sit next to the external meter's figures.
fn measure_embedded(audio: &DecodedAudio, with_maxima: bool) -> anyhow::Result<LoudnessMetrics> {
    let meter = EbuR128Meter::new();
    let integrated = meter.measure(&audio.samples, audio.sample_rate)?;
    let mut metrics =
        LoudnessMetrics::integrated_only(integrated, MeasurementBasis::MonoMixdown);

    if with_maxima {
        metrics.momentary_max_lufs = windowed_loudness_max(
            &meter,
            &audio.samples,
            audio.sample_rate,
            WindowSpec::MOMENTARY,
        );
        metrics.short_term_max_lufs = windowed_loudness_max(
            &meter,
            &audio.samples,
            audio.sample_rate,
            WindowSpec::SHORT_TERM,
        );
    }

    Ok(metrics)
}

/// Run both paths and cross-check; the external side is the reference.
fn measure_compared(path: &Path, audio: &DecodedAudio) -> anyhow::Result<Measurement> {
    let embedded = measure_embedded(audio, true)?;
    let external = ffmpeg::measure_external(path)?;
    Ok(Measurement::Compared(Comparison::new(external, embedded)))
}

/// Measure-only run.
pub fn analyse_file(path: &Path, opts: &AnalyseOptions) -> anyhow::Result<FileOutcome> {
    let audio = load(path)?;
    let peak_dbfs = sample_peak_dbfs(&audio.samples);
    let duration = audio.duration_seconds();

    let measurement = if peak_dbfs == f64::NEG_INFINITY {
        // digital silence: both paths agree by definition, skip the meters
        Measurement::Embedded(silent_metrics(MeasurementBasis::MonoMixdown))
    } else if opts.compare {
        measure_compared(path, &audio)?
    } else {
        match opts.engine {
            MeterEngine::Embedded => Measurement::Embedded(measure_embedded(&audio, false)?),
            MeterEngine::External => Measurement::External(ffmpeg::measure_external(path)?),
        }
    };

    let mut report = Report::from_measurement(
        path.display().to_string(),
        audio.sample_rate,
        duration,
        peak_dbfs,
        &measurement,
    );

    if let Some(target) = opts.target_lufs {
        let compliance = evaluate(measurement.integrated_lufs(), target, opts.tolerance_lu);
        report = report.with_compliance(&compliance);
    }

    Ok(FileOutcome {
        report,
        short_audio_warning: short_audio_warning(duration),
        exit_code: 0,
    })
}

/// Full normalization run: measure, evaluate, plan, decide, maybe render.
pub fn normalise_file(path: &Path, opts: &NormaliseOptions) -> anyhow::Result<FileOutcome> {
    let audio = load(path)?;
    let peak_dbfs = sample_peak_dbfs(&audio.samples);
    let duration = audio.duration_seconds();

    let measurement = if peak_dbfs == f64::NEG_INFINITY {
        Measurement::External(silent_metrics(MeasurementBasis::WholeFile))
    } else if opts.compare {
        measure_compared(path, &audio)?
    } else {
        // the external meter is the reference for writes
        Measurement::External(ffmpeg::measure_external(path)?)
    };

    let measured = measurement.integrated_lufs();
    let compliance = evaluate(measured, opts.target_lufs, opts.tolerance_lu);

    let planner = GainPlanner::new(
        opts.min_gain_db,
        opts.max_gain_db,
        opts.true_peak_limit_dbtp,
    )?;
    let gain = if compliance.is_silent() {
        // neutral plan so the decision engine can still run; silence wins
        // before any of its fields are consulted
        planner.plan(opts.target_lufs, opts.target_lufs, f64::NEG_INFINITY, None)
    } else {
        planner.plan(
            measured,
            opts.target_lufs,
            peak_dbfs,
            measurement.metrics().true_peak_dbtp,
        )
    };

    let output_path = opts
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(path));
    let output_exists = output_path.exists();

    let decision = decide(&compliance, &gain, opts.policy, output_exists, &output_path);

    if let ApplyDecision::Write(ref out) = decision {
        write_wav_with_gain(out, &audio.samples, audio.sample_rate, gain.applied_gain_db)
            .with_context(|| format!("writing '{}'", out.display()))?;
    }

    let mut report = Report::from_measurement(
        path.display().to_string(),
        audio.sample_rate,
        duration,
        peak_dbfs,
        &measurement,
    )
    .with_compliance(&compliance);
    if !compliance.is_silent() {
        report = report.with_gain(&gain);
    }
    let report = report.with_decision(&decision);

    let exit_code = i32::from(matches!(decision, ApplyDecision::Abort(_)));

    Ok(FileOutcome {
        report,
        short_audio_warning: short_audio_warning(duration),
        exit_code,
    })
}

/// Outcome tallies for one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub written: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub failed: usize,
}

/// Normalise every supported file in `folder`.
///
/// Each file is independent: failures are logged and the run continues.
/// Files already carrying the output prefix are not treated as inputs, so
/// repeated runs do not re-normalise their own output.
pub fn batch_normalise(
    folder: &Path,
    output_folder: Option<&Path>,
    opts: &NormaliseOptions,
    mut per_file: impl FnMut(&Path, &anyhow::Result<FileOutcome>),
) -> anyhow::Result<BatchSummary> {
    let files = list_audio_files(folder)?;

    // a relative output folder lives inside the input folder
    let output_folder = output_folder.map(|dir| {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            folder.join(dir)
        }
    });

    if let Some(out_dir) = &output_folder {
        if !opts.policy.dry_run {
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("creating output folder '{}'", out_dir.display()))?;
        }
    }

    let mut summary = BatchSummary::default();

    for file in files {
        if is_rendered_output(&file) {
            tracing::debug!(file = %file.display(), "skipping rendered output");
            continue;
        }

        let mut file_opts = opts.clone();
        file_opts.output = Some(match &output_folder {
            Some(dir) => dir.join(
                default_output_path(&file)
                    .file_name()
                    .map(std::ffi::OsStr::to_os_string)
                    .unwrap_or_default(),
            ),
            None => default_output_path(&file),
        });

        summary.processed += 1;
        let outcome = normalise_file(&file, &file_opts);
        match &outcome {
            Ok(o) => match o.report.decision {
                Some("write") | Some("dry_run") => summary.written += 1,
                Some("abort") => summary.aborted += 1,
                _ => summary.skipped += 1,
            },
            Err(err) => {
                summary.failed += 1;
                tracing::error!(file = %file.display(), %err, "file failed, continuing");
            }
        }
        per_file(&file, &outcome);
    }

    Ok(summary)
}

#[derive(Debug, Clone)]
pub struct PeakOptions {
    /// Linear target peak amplitude, in (0.0, 1.0]
    pub target_peak: f64,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

/// One file's completed peak-normalisation run.
#[derive(Debug)]
pub struct PeakOutcome {
    pub file: String,
    pub sample_rate: u32,
    pub duration_seconds: f64,
    /// Linear peak amplitude before and after scaling
    pub peak_before: f64,
    pub peak_after: f64,
    pub gain_db: f64,
    pub output_path: PathBuf,
    pub written: bool,
}

/// Scale a file so its sample peak lands exactly on `target_peak`.
///
/// Works in the linear peak domain rather than LUFS; a silent input has
/// no peak to scale and is an error, matching the loudness path's
/// treatment of silence as "nothing to do" but with no safe no-op here.
pub fn peak_normalise_file(path: &Path, opts: &PeakOptions) -> anyhow::Result<PeakOutcome> {
    if !(opts.target_peak > 0.0 && opts.target_peak <= 1.0) {
        bail!(
            "target peak {} is out of range (must be in (0.0, 1.0])",
            opts.target_peak
        );
    }

    let audio = load(path)?;
    let peak_dbfs = sample_peak_dbfs(&audio.samples);
    if peak_dbfs == f64::NEG_INFINITY {
        bail!("'{}' is silent (peak = 0); cannot peak-normalise", path.display());
    }

    let peak_before = linear_from_db(peak_dbfs);
    let gain_db = db_from_linear(opts.target_peak) - peak_dbfs;
    let peak_after = peak_before * linear_from_db(gain_db);

    let output_path = opts
        .output
        .clone()
        .unwrap_or_else(|| peak_output_path(path));

    if !opts.dry_run {
        write_wav_with_gain(&output_path, &audio.samples, audio.sample_rate, gain_db)
            .with_context(|| format!("writing '{}'", output_path.display()))?;
    }

    Ok(PeakOutcome {
        file: path.display().to_string(),
        sample_rate: audio.sample_rate,
        duration_seconds: audio.duration_seconds(),
        peak_before,
        peak_after,
        gain_db,
        output_path,
        written: !opts.dry_run,
    })
}

/// Peak-normalise every supported file in `folder`.
///
/// Mirrors [`batch_normalise`]: per-file failures are logged and the run
/// continues, and files already carrying the peak output prefix are not
/// treated as inputs.
pub fn batch_peak_normalise(
    folder: &Path,
    output_folder: Option<&Path>,
    opts: &PeakOptions,
    mut per_file: impl FnMut(&Path, &anyhow::Result<PeakOutcome>),
) -> anyhow::Result<BatchSummary> {
    let files = list_audio_files(folder)?;

    let output_folder = output_folder.map(|dir| {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            folder.join(dir)
        }
    });

    if let Some(out_dir) = &output_folder {
        if !opts.dry_run {
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("creating output folder '{}'", out_dir.display()))?;
        }
    }

    let mut summary = BatchSummary::default();

    for file in files {
        if is_peak_output(&file) {
            tracing::debug!(file = %file.display(), "skipping normalised output");
            continue;
        }

        let mut file_opts = opts.clone();
        file_opts.output = Some(match &output_folder {
            Some(dir) => dir.join(
                peak_output_path(&file)
                    .file_name()
                    .map(std::ffi::OsStr::to_os_string)
                    .unwrap_or_default(),
            ),
            None => peak_output_path(&file),
        });

        summary.processed += 1;
        let outcome = peak_normalise_file(&file, &file_opts);
        match &outcome {
            Ok(_) => summary.written += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::error!(file = %file.display(), %err, "file failed, continuing");
            }
        }
        per_file(&file, &outcome);
    }

    Ok(summary)
}
