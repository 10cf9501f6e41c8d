use log::{debug, Level};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TruncateError};
use crate::transient::report::{CutOverlay, DiagnosticsSink};
use crate::transient::{removed_fraction, rezero, validate_pair, FallbackReason, Outcome, Truncation};
use crate::util::{centred_box_sum, centred_moving_average, mean, rolling_rms};

/// How the rolling RMS is smoothed before thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Smoothing {
    /// True moving average of the same width as the RMS window.
    #[default]
    Normalized,
    /// The historical kernel of `floor(1 / window)` weights. For any window
    /// wider than one sample this zeroes the envelope, so nothing is ever cut.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeOptions {
    pub window: usize,
    pub tol: f64,
    pub smoothing: Smoothing,
    pub plot: bool,
    pub verbose: bool,
}

impl Default for AmplitudeOptions {
    fn default() -> Self {
        Self {
            window: 500,
            tol: 0.02,
            smoothing: Smoothing::Normalized,
            plot: false,
            verbose: true,
        }
    }
}

impl AmplitudeOptions {
    fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(TruncateError::InvalidInput("window must be at least 1 sample".to_string()));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(TruncateError::InvalidInput(format!(
                "tol must be a non-negative number, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Smoothed rolling RMS envelope of the mean-removed signal.
///
/// Entry `j` summarises samples `j..j + window`. Empty when the window does
/// not fit strictly inside the signal.
pub fn rms_envelope(y: &[f64], window: usize, smoothing: Smoothing) -> Vec<f64> {
    if window == 0 || window >= y.len() {
        return Vec::new();
    }

    let centre = mean(y);
    let centred: Vec<f64> = y.iter().map(|&v| v - centre).collect();
    let rms = rolling_rms(&centred, window);

    match smoothing {
        Smoothing::Normalized => centred_moving_average(&rms, window),
        Smoothing::Legacy => {
            let weight = (1 / window) as f64;
            centred_box_sum(&rms, window, weight)
        }
    }
}

/// Remove the initial transient by watching the oscillation amplitude settle.
///
/// The envelope is compared against `(1 + tol)` times its own tail average;
/// the first window that falls under it marks the cut. When nothing qualifies
/// the input comes back unchanged (not re-zeroed).
pub fn truncate_transient(
    t: &[f64],
    y: &[f64],
    options: &AmplitudeOptions,
    sink: &mut dyn DiagnosticsSink,
) -> Result<Truncation> {
    validate_pair(t, y)?;
    options.validate()?;

    let window = options.window;
    let envelope = rms_envelope(y, window, options.smoothing);
    if envelope.is_empty() {
        debug!("Window of {} samples does not fit {} samples", window, y.len());
        return Ok(fallback(t, y, FallbackReason::InsufficientSamples, options, sink));
    }

    let tail_start = envelope.len().saturating_sub(window);
    let final_rms = mean(&envelope[tail_start..]);
    let threshold = (1.0 + options.tol) * final_rms;
    debug!("Final RMS {:.5}, threshold {:.5}", final_rms, threshold);

    let first = match envelope.iter().position(|&r| r < threshold) {
        Some(j) => j,
        None => return Ok(fallback(t, y, FallbackReason::NeverStabilized, options, sink)),
    };

    let cut_index = first + window - 1;
    let t_cut = t[cut_index];
    let (kept_t, y_trunc): (Vec<f64>, Vec<f64>) = t
        .iter()
        .zip(y.iter())
        .filter(|(&ti, _)| ti >= t_cut)
        .map(|(&ti, &yi)| (ti, yi))
        .unzip();
    let t_trunc = rezero(&kept_t);
    let removed = t.len() - t_trunc.len();
    // Repeated timestamps can pull the first retained sample before `cut_index`.
    let index = t.iter().position(|&ti| ti >= t_cut).unwrap_or(cut_index);

    if options.verbose {
        sink.message(
            Level::Info,
            &format!(
                "Detected stabilization at t ≈ {:.1}s ({} samples removed, {:.1}% of data).",
                t_cut,
                removed,
                removed_fraction(removed, t.len())
            ),
        );
    }
    if options.plot {
        sink.cut_overlay(&CutOverlay {
            t,
            y,
            t_cut,
            t_trunc: &t_trunc,
            y_trunc: &y_trunc,
        });
    }

    Ok(Truncation {
        t: t_trunc,
        y: y_trunc,
        outcome: Outcome::Cut {
            index,
            t_cut,
            cycle: None,
            removed,
        },
    })
}

fn fallback(
    t: &[f64],
    y: &[f64],
    reason: FallbackReason,
    options: &AmplitudeOptions,
    sink: &mut dyn DiagnosticsSink,
) -> Truncation {
    if options.verbose {
        sink.message(
            Level::Warn,
            &format!("{}, returning full dataset.", capitalise(reason.describe())),
        );
    }
    Truncation {
        t: t.to_vec(),
        y: y.to_vec(),
        outcome: Outcome::NoCut(reason),
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
