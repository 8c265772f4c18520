/// lufs - loudness measurement and normalization toolkit
use clap::{Parser, Subcommand};
use lufs_audio::list_audio_files;
use lufs_engine::{
    WritePolicy, DEFAULT_TOLERANCE_LU, DEFAULT_TRUE_PEAK_LIMIT_DBTP, STREAMING_TARGET_LUFS,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ffmpeg;
mod pipeline;
mod report;

use pipeline::{AnalyseOptions, FileOutcome, MeterEngine, NormaliseOptions, PeakOptions};

#[derive(Parser)]
#[command(name = "lufs")]
#[command(about = "Measure loudness and plan safe gain moves", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a file without touching it
    Analyse {
        /// Audio file to measure
        file: PathBuf,
        /// Which measurement path to use
        #[arg(long, value_enum, default_value = "embedded")]
        engine: MeterEngine,
        /// Run both paths and report their delta
        #[arg(long)]
        compare: bool,
        /// Also evaluate against this target loudness
        #[arg(long)]
        target_lufs: Option<f64>,
        /// Compliance tolerance in LU
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_LU)]
        tolerance: f64,
        /// Emit the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Measure, plan a clamped gain, and render the result
    Normalise {
        /// Audio file to normalise
        file: PathBuf,
        /// Target integrated loudness in LUFS
        #[arg(long, default_value_t = STREAMING_TARGET_LUFS)]
        target_lufs: f64,
        /// Compliance tolerance in LU
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_LU)]
        tolerance: f64,
        /// Output path (default: targeted_<stem>.wav beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Lower gain clamp in dB
        #[arg(long, default_value_t = -24.0, allow_hyphen_values = true)]
        min_gain_db: f64,
        /// Upper gain clamp in dB
        #[arg(long, default_value_t = 12.0, allow_hyphen_values = true)]
        max_gain_db: f64,
        /// True-peak warning limit in dBTP
        #[arg(long, default_value_t = DEFAULT_TRUE_PEAK_LIMIT_DBTP, allow_hyphen_values = true)]
        true_peak_limit: f64,
        /// Cross-check the external meter against the embedded one
        #[arg(long)]
        compare: bool,
        /// Write even when already within tolerance
        #[arg(long)]
        force: bool,
        /// Write even when the predicted peak exceeds 0 dBFS
        #[arg(long)]
        allow_clip: bool,
        /// Replace an existing output file
        #[arg(long)]
        overwrite: bool,
        /// Plan and report without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Emit the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Normalise every supported file in a folder
    Batch {
        /// Folder of audio files
        folder: PathBuf,
        /// Folder for rendered outputs (default: beside each input)
        #[arg(long)]
        output_folder: Option<PathBuf>,
        /// Target integrated loudness in LUFS
        #[arg(long, default_value_t = STREAMING_TARGET_LUFS)]
        target_lufs: f64,
        /// Compliance tolerance in LU
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_LU)]
        tolerance: f64,
        /// Lower gain clamp in dB
        #[arg(long, default_value_t = -24.0, allow_hyphen_values = true)]
        min_gain_db: f64,
        /// Upper gain clamp in dB
        #[arg(long, default_value_t = 12.0, allow_hyphen_values = true)]
        max_gain_db: f64,
        /// True-peak warning limit in dBTP
        #[arg(long, default_value_t = DEFAULT_TRUE_PEAK_LIMIT_DBTP, allow_hyphen_values = true)]
        true_peak_limit: f64,
        /// Write even when already within tolerance
        #[arg(long)]
        force: bool,
        /// Write even when the predicted peak exceeds 0 dBFS
        #[arg(long)]
        allow_clip: bool,
        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,
        /// Plan and report without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Emit one JSON line per file
        #[arg(long)]
        json: bool,
    },
    /// Scale a file or folder of files to a linear target peak
    Peak {
        /// Audio file, or folder to process in bulk
        path: PathBuf,
        /// Target peak amplitude in (0.0, 1.0]
        #[arg(long, default_value_t = 0.9)]
        target_peak: f64,
        /// Output path (single file; default: normalized_<stem>.wav)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Folder for rendered outputs (folder mode; relative paths land
        /// inside the input folder)
        #[arg(long)]
        output_folder: Option<PathBuf>,
        /// Report without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List the supported audio files in a folder
    Scan {
        /// Folder to scan
        folder: PathBuf,
    },
}

/// Single-file JSON is pretty-printed; batch emits one line per file so
/// downstream tools can stream it.
fn print_outcome(outcome: &FileOutcome, json: bool, pretty: bool) {
    if json {
        println!("{}", outcome.report.to_json(pretty));
    } else {
        let warnings: Vec<String> = outcome.short_audio_warning.iter().cloned().collect();
        print!("{}", report::render(&outcome.report, &warnings));
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Analyse {
            file,
            engine,
            compare,
            target_lufs,
            tolerance,
            json,
        } => {
            let opts = AnalyseOptions {
                engine,
                compare,
                target_lufs,
                tolerance_lu: tolerance,
            };
            let outcome = pipeline::analyse_file(&file, &opts)?;
            print_outcome(&outcome, json, true);
            Ok(outcome.exit_code)
        }
        Commands::Normalise {
            file,
            target_lufs,
            tolerance,
            output,
            min_gain_db,
            max_gain_db,
            true_peak_limit,
            compare,
            force,
            allow_clip,
            overwrite,
            dry_run,
            json,
        } => {
            let opts = NormaliseOptions {
                compare,
                target_lufs,
                tolerance_lu: tolerance,
                output,
                min_gain_db,
                max_gain_db,
                true_peak_limit_dbtp: true_peak_limit,
                policy: WritePolicy {
                    force,
                    allow_clip,
                    overwrite,
                    dry_run,
                },
            };
            let outcome = pipeline::normalise_file(&file, &opts)?;
            print_outcome(&outcome, json, true);
            Ok(outcome.exit_code)
        }
        Commands::Batch {
            folder,
            output_folder,
            target_lufs,
            tolerance,
            min_gain_db,
            max_gain_db,
            true_peak_limit,
            force,
            allow_clip,
            overwrite,
            dry_run,
            json,
        } => {
            let opts = NormaliseOptions {
                compare: false,
                target_lufs,
                tolerance_lu: tolerance,
                output: None,
                min_gain_db,
                max_gain_db,
                true_peak_limit_dbtp: true_peak_limit,
                policy: WritePolicy {
                    force,
                    allow_clip,
                    overwrite,
                    dry_run,
                },
            };
            let summary = pipeline::batch_normalise(
                &folder,
                output_folder.as_deref(),
                &opts,
                |_, outcome| {
                    if let Ok(outcome) = outcome {
                        print_outcome(outcome, json, false);
                    }
                },
            )?;
            if !json {
                println!(
                    "{} processed: {} written or planned, {} skipped, {} aborted, {} failed",
                    summary.processed,
                    summary.written,
                    summary.skipped,
                    summary.aborted,
                    summary.failed
                );
            }
            Ok(i32::from(summary.aborted > 0 || summary.failed > 0))
        }
        Commands::Peak {
            path,
            target_peak,
            output,
            output_folder,
            dry_run,
        } => {
            let opts = PeakOptions {
                target_peak,
                output,
                dry_run,
            };
            if path.is_dir() {
                let summary = pipeline::batch_peak_normalise(
                    &path,
                    output_folder.as_deref(),
                    &opts,
                    |_, outcome| {
                        if let Ok(outcome) = outcome {
                            print!("{}", report::render_peak(outcome));
                        }
                    },
                )?;
                println!(
                    "{} processed: {} scaled or planned, {} failed",
                    summary.processed, summary.written, summary.failed
                );
                Ok(i32::from(summary.failed > 0))
            } else {
                let outcome = pipeline::peak_normalise_file(&path, &opts)?;
                print!("{}", report::render_peak(&outcome));
                Ok(0)
            }
        }
        Commands::Scan { folder } => {
            let files = list_audio_files(&folder)?;
            for file in &files {
                println!("{}", file.display());
            }
            tracing::info!(count = files.len(), "scan complete");
            Ok(0)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lufs=info,lufs_engine=info,lufs_audio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
