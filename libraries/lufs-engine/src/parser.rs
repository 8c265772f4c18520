//! Meter-log parser
//!
//! Extracts [`LoudnessMetrics`] from the diagnostic text an external
//! `ebur128` metering filter writes while running. The stream is a long
//! "running meter" of momentary (`M:`) and short-term (`S:`) values at a
//! fixed cadence, terminated by a `Summary:` block carrying the
//! authoritative integrated (`I:`), loudness-range (`LRA:`) and sometimes
//! true-peak (`TP:`) figures.
//!
//! Each metric is extracted through an ordered list of strategies, tried
//! independently so one missing metric never blocks the others:
//!
//! - integrated: Summary block, then the last running `I: <v> LUFS` line;
//!   if both fail the whole parse fails ([`EngineError::MissingIntegrated`])
//! - LRA: Summary block only
//! - momentary / short-term maxima: max of the running `M:` / `S:` values
//!   above the -70 LUFS measurement floor
//! - true peak: Summary `TP:`, then the last inline `TP: <v> dBTP`, then a
//!   `True peak:` header block inspected line by line (formatting differs
//!   across tool builds)

use crate::error::{EngineError, Result};
use crate::metrics::{LoudnessMetrics, MeasurementBasis};

/// Running-meter values at or below this level are measurement-floor
/// artifacts (startup, silence) and never contribute to the maxima.
pub const LOUDNESS_FLOOR_LUFS: f64 = -70.0;

/// Lines inspected after a `True peak:` header before giving up.
const TRUE_PEAK_BLOCK_LINES: usize = 25;

/// Parse one complete meter log into a [`LoudnessMetrics`].
pub fn parse_meter_log(text: &str) -> Result<LoudnessMetrics> {
    let summary = summary_section(text);

    let integrated = summary
        .and_then(|s| summary_value(s, "I"))
        .or_else(|| last_tagged_value(text, "I", "LUFS"))
        .ok_or(EngineError::MissingIntegrated)?;

    let loudness_range_lu = summary.and_then(|s| summary_value(s, "LRA"));

    let momentary_max_lufs = running_max_above_floor(text, "M");
    let short_term_max_lufs = running_max_above_floor(text, "S");

    let true_peak_dbtp = summary
        .and_then(|s| summary_value(s, "TP"))
        .or_else(|| last_tagged_value(text, "TP", "dBTP"))
        .or_else(|| true_peak_from_block(text));

    tracing::debug!(
        integrated,
        ?loudness_range_lu,
        ?true_peak_dbtp,
        "parsed meter log"
    );

    Ok(LoudnessMetrics {
        integrated_lufs: integrated,
        loudness_range_lu,
        momentary_max_lufs,
        short_term_max_lufs,
        true_peak_dbtp,
        basis: MeasurementBasis::WholeFile,
    })
}

/// The text from the final `Summary:` marker onward, if one exists.
///
/// The Summary block repeats `I:`/`LRA:` in their final form, free of the
/// -70 LUFS floor artifacts the running meter carries.
fn summary_section(text: &str) -> Option<&str> {
    text.rfind("Summary:").map(|idx| &text[idx..])
}

/// Extract `<tag>: <value> <unit>` from a Summary block.
///
/// Only whole lines of exactly that shape count, mirroring the strictness
/// of the final block (`LUFS`, `LU` and `dBTP` are the accepted units).
fn summary_value(section: &str, tag: &str) -> Option<f64> {
    for line in section.lines() {
        let rest = match line.trim_start().strip_prefix(tag) {
            Some(r) => r,
            None => continue,
        };
        let rest = match rest.strip_prefix(':') {
            Some(r) => r,
            None => continue,
        };

        let mut tokens = rest.split_whitespace();
        let value = tokens.next().and_then(parse_finite);
        let unit_ok = matches!(tokens.next(), Some("LUFS" | "LU" | "dBTP"));
        if tokens.next().is_some() {
            continue;
        }
        if let (Some(v), true) = (value, unit_ok) {
            return Some(v);
        }
    }
    None
}

/// Last `<tag>: <value> <unit>` occurrence anywhere in the stream.
///
/// Fallback for builds whose Summary block is absent or reformatted; the
/// running meter repeats the tag on every line, so the last hit is the
/// final reading.
fn last_tagged_value(text: &str, tag: &str, unit: &str) -> Option<f64> {
    let mut last = None;
    for line in text.lines() {
        let mut search = line;
        while let Some((value, rest)) = next_keyed_token(search, tag) {
            let mut tokens = rest.split_whitespace();
            if let Some(v) = parse_finite(value) {
                if tokens.next().is_some_and(|u| u.starts_with(unit)) {
                    last = Some(v);
                }
            }
            search = rest;
        }
    }
    last
}

/// Maximum of all running `<tag>:` values above the measurement floor.
///
/// `nan` entries (meter warm-up) are skipped; values at or below
/// [`LOUDNESS_FLOOR_LUFS`] are artifacts and excluded. This is an offline
/// maximum over the whole run, not a real-time peak hold.
fn running_max_above_floor(text: &str, tag: &str) -> Option<f64> {
    let mut best: Option<f64> = None;
    for line in text.lines() {
        let mut search = line;
        while let Some((value, rest)) = next_keyed_token(search, tag) {
            if let Some(v) = parse_finite(value) {
                if v > LOUDNESS_FLOOR_LUFS && best.map_or(true, |b| v > b) {
                    best = Some(v);
                }
            }
            search = rest;
        }
    }
    best
}

/// Find `<tag>:` in `haystack` and return the token after it plus the
/// remainder of the line.
///
/// The character before the tag must not be alphanumeric, so `M:` does not
/// fire inside `SUM:`.
fn next_keyed_token<'a>(haystack: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
    let key_len = tag.len() + 1;
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(tag) {
        let idx = from + rel;
        let tag_end = idx + tag.len();
        let boundary_ok = haystack[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        let colon = haystack[tag_end..].starts_with(':');
        if boundary_ok && colon {
            let rest = haystack[idx + key_len..].trim_start();
            let end = rest
                .find(char::is_whitespace)
                .unwrap_or(rest.len());
            return Some((&rest[..end], &rest[end..]));
        }
        from = idx + 1;
    }
    None
}

/// Multi-line true-peak fallback.
///
/// Some builds print a `True peak:` header followed by an indented block.
/// First any `<value> dBTP` token in the block wins; failing that, a bare
/// `Peak: <value>` line (with an optional dBTP/dBFS unit) is accepted.
fn true_peak_from_block(text: &str) -> Option<f64> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines
        .iter()
        .rposition(|l| l.trim_start().to_ascii_lowercase().starts_with("true peak:"))?;
    let block = lines
        .iter()
        .skip(header + 1)
        .take(TRUE_PEAK_BLOCK_LINES);

    // Pass 1: a number immediately followed by a dBTP token.
    for line in block.clone() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        for pair in tokens.windows(2) {
            if pair[1].eq_ignore_ascii_case("dBTP") {
                if let Some(v) = parse_finite(pair[0]) {
                    return Some(v);
                }
            }
        }
    }

    // Pass 2: bare `Peak: <value>` lines.
    for line in block {
        let rest = line.trim_start();
        let rest = rest
            .strip_prefix("Peak")
            .or_else(|| rest.strip_prefix("peak"))
            .or_else(|| rest.strip_prefix("PEAK"));
        let rest = match rest.and_then(|r| r.strip_prefix(':')) {
            Some(r) => r,
            None => continue,
        };
        let mut tokens = rest.split_whitespace();
        let value = tokens.next().and_then(parse_finite);
        let unit_ok = match tokens.next() {
            None => true,
            Some(u) => u.eq_ignore_ascii_case("dBTP") || u.eq_ignore_ascii_case("dBFS"),
        };
        if tokens.next().is_some() {
            continue;
        }
        if let (Some(v), true) = (value, unit_ok) {
            return Some(v);
        }
    }

    None
}

/// Parse a token as a finite float; `nan`/`inf` tokens are rejected so the
/// metrics invariant (finite or explicit `-inf`) holds.
fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
