//! Windowed loudness maxima
//!
//! The embedded primitive only offers a single-shot integrated measurement,
//! so momentary / short-term loudness is approximated offline by sliding a
//! fixed window over the buffer and keeping the loudest window.

use crate::meter::IntegratedLoudnessMeter;

/// Analysis window geometry in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub window_secs: f64,
    pub step_secs: f64,
}

impl WindowSpec {
    /// Momentary loudness approximation: 0.4 s window, 0.1 s step.
    pub const MOMENTARY: Self = Self {
        window_secs: 0.4,
        step_secs: 0.1,
    };

    /// Short-term loudness approximation: 3.0 s window, 0.5 s step.
    pub const SHORT_TERM: Self = Self {
        window_secs: 3.0,
        step_secs: 0.5,
    };
}

/// Maximum integrated loudness over all windows, in LUFS.
///
/// Returns `None` when no window fits: the buffer is shorter than one
/// window, the sample rate is zero, or either length rounds to zero
/// samples. Windows whose measurement fails or comes back non-finite are
/// dropped rather than aborting the sweep.
pub fn windowed_loudness_max<M: IntegratedLoudnessMeter + ?Sized>(
    meter: &M,
    samples: &[f32],
    sample_rate: u32,
    spec: WindowSpec,
) -> Option<f64> {
    if sample_rate == 0 {
        return None;
    }

    let win_n = (spec.window_secs * f64::from(sample_rate)).round() as usize;
    let step_n = (spec.step_secs * f64::from(sample_rate)).round() as usize;

    if win_n == 0 || step_n == 0 || samples.len() < win_n {
        return None;
    }

    let mut best: Option<f64> = None;
    let mut start = 0;
    while start + win_n <= samples.len() {
        match meter.measure(&samples[start..start + win_n], sample_rate) {
            Ok(v) if v.is_finite() => {
                if best.map_or(true, |b| v > b) {
                    best = Some(v);
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::trace!(start, %err, "window measurement failed, skipping");
            }
        }
        start += step_n;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    /// Meter stub returning a scripted value per window, in call order.
    struct ScriptedMeter {
        values: Vec<f64>,
        calls: std::cell::Cell<usize>,
    }

    impl ScriptedMeter {
        fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                calls: std::cell::Cell::new(0),
            }
        }
    }

    impl IntegratedLoudnessMeter for ScriptedMeter {
        fn measure(&self, _samples: &[f32], _sample_rate: u32) -> Result<f64> {
            let i = self.calls.get();
            self.calls.set(i + 1);
            Ok(self.values.get(i).copied().unwrap_or(f64::NEG_INFINITY))
        }
    }

    #[test]
    fn test_tracks_running_maximum() {
        let meter = ScriptedMeter::new(vec![-30.0, -18.5, -22.0]);
        // 1.0 s window, 1.0 s step over 3 s of audio: exactly 3 windows
        let samples = vec![0.0_f32; 3000];
        let spec = WindowSpec {
            window_secs: 1.0,
            step_secs: 1.0,
        };
        let max = windowed_loudness_max(&meter, &samples, 1000, spec);
        assert_eq!(max, Some(-18.5));
        assert_eq!(meter.calls.get(), 3);
    }

    #[test]
    fn test_non_finite_windows_dropped() {
        let meter = ScriptedMeter::new(vec![f64::NEG_INFINITY, -25.0, f64::NEG_INFINITY]);
        let samples = vec![0.0_f32; 3000];
        let spec = WindowSpec {
            window_secs: 1.0,
            step_secs: 1.0,
        };
        let max = windowed_loudness_max(&meter, &samples, 1000, spec);
        assert_eq!(max, Some(-25.0));
    }

    #[test]
    fn test_all_windows_silent_is_unavailable() {
        let meter = ScriptedMeter::new(vec![f64::NEG_INFINITY; 3]);
        let samples = vec![0.0_f32; 3000];
        let spec = WindowSpec {
            window_secs: 1.0,
            step_secs: 1.0,
        };
        assert_eq!(windowed_loudness_max(&meter, &samples, 1000, spec), None);
    }

    #[test]
    fn test_buffer_shorter_than_window() {
        let meter = ScriptedMeter::new(vec![-10.0]);
        let samples = vec![0.0_f32; 100];
        let spec = WindowSpec {
            window_secs: 1.0,
            step_secs: 0.5,
        };
        assert_eq!(windowed_loudness_max(&meter, &samples, 1000, spec), None);
        assert_eq!(meter.calls.get(), 0);
    }

    #[test]
    fn test_degenerate_geometry() {
        let meter = ScriptedMeter::new(vec![-10.0]);
        let samples = vec![0.0_f32; 1000];
        let zero_window = WindowSpec {
            window_secs: 0.0,
            step_secs: 0.5,
        };
        let zero_step = WindowSpec {
            window_secs: 0.5,
            step_secs: 0.0,
        };
        assert_eq!(
            windowed_loudness_max(&meter, &samples, 1000, zero_window),
            None
        );
        assert_eq!(
            windowed_loudness_max(&meter, &samples, 1000, zero_step),
            None
        );
        assert_eq!(windowed_loudness_max(&meter, &samples, 0, zero_step), None);
    }

    #[test]
    fn test_stride_geometry() {
        // 10 samples, window 4, step 2: windows start at 0,2,4,6 -> 4 calls
        let meter = ScriptedMeter::new(vec![-20.0, -19.0, -21.0, -18.0]);
        let samples = vec![0.0_f32; 10];
        // contrive secs so win_n=4, step_n=2 at sr=1000 -> 0.004 / 0.002
        let spec = WindowSpec {
            window_secs: 0.004,
            step_secs: 0.002,
        };
        let max = windowed_loudness_max(&meter, &samples, 1000, spec);
        assert_eq!(max, Some(-18.0));
        assert_eq!(meter.calls.get(), 4);
    }
}
