//! External metering tool invocation
//!
//! Runs ffmpeg's `ebur128` filter over a file and hands the raw diagnostic
//! text to the engine's parser. This is the only blocking subprocess step
//! in the toolkit; the engine itself never spawns anything.

use anyhow::{bail, Context};
use lufs_engine::{parse_meter_log, LoudnessMetrics};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// Run the external meter over `path` and return its diagnostic text.
///
/// ffmpeg writes the running meter and Summary block to stderr.
pub fn run_meter(path: &Path) -> anyhow::Result<String> {
    let result = Command::new("ffmpeg")
        .args(["-hide_banner", "-i"])
        .arg(path)
        .args(["-filter_complex", "ebur128=peak=true", "-f", "null", "-"])
        .output();

    let output = match result {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("ffmpeg not found on PATH; the external engine needs it installed")
        }
        other => other.context("failed to run ffmpeg")?,
    };

    if !output.status.success() {
        bail!(
            "ffmpeg failed to analyse '{}' (exit status {})",
            path.display(),
            output.status
        );
    }

    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Measure a file with the external meter and parse the result.
pub fn measure_external(path: &Path) -> anyhow::Result<LoudnessMetrics> {
    let log = run_meter(path)?;
    tracing::debug!(bytes = log.len(), "captured meter log");
    parse_meter_log(&log)
        .with_context(|| format!("unusable meter output for '{}'", path.display()))
}
