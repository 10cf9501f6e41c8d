//! Transient detection and truncation for periodically driven signals.
//!
//! Two independent detectors share the same contract: a `(t, y)` pair goes
//! in, a [`Truncation`] holding the steady-state part (re-zeroed in time)
//! comes out. Failing to find a cut is not an error; it is reported as
//! [`Outcome::NoCut`] alongside the data the caller should continue with.

pub mod amplitude;
pub mod cycle;
pub mod report;

pub use amplitude::{truncate_transient, AmplitudeOptions, Smoothing};
pub use cycle::{remove_transient, CycleMean, CycleOptions};
pub use report::{CutOverlay, CycleMeansPlot, DiagnosticsSink, LogSink, NullSink};

use serde::Serialize;

use crate::error::{Result, TruncateError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FallbackReason {
    /// Fewer samples than the detector needs to compute anything.
    InsufficientSamples,
    /// Not enough cycles overall to separate a tail from the rest.
    TooFewCycles,
    /// Not enough well-sampled cycles to form the tail reference.
    TooFewWellSampledCycles,
    /// The signal never settled inside the tolerance.
    NeverStabilized,
}

impl FallbackReason {
    pub fn describe(&self) -> &'static str {
        match self {
            FallbackReason::InsufficientSamples => "not enough samples",
            FallbackReason::TooFewCycles => "not enough cycles for a tail reference",
            FallbackReason::TooFewWellSampledCycles => "not enough well-sampled cycles",
            FallbackReason::NeverStabilized => "no stabilization detected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    Cut {
        /// Index into the input arrays of the first retained sample. Every
        /// sample before it was removed, so this equals `removed` for sorted
        /// timestamps.
        index: usize,
        /// Timestamp (original axis) at which the signal is taken as steady.
        t_cut: f64,
        /// Cycle index of the cut, for the cycle-mean detector.
        cycle: Option<usize>,
        removed: usize,
    },
    NoCut(FallbackReason),
}

impl Outcome {
    pub fn is_cut(&self) -> bool {
        matches!(self, Outcome::Cut { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Truncation {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
    pub outcome: Outcome,
}

impl Truncation {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.t, self.y)
    }

    /// One-line account of the branch taken, for `total` input samples.
    pub fn summary(&self, total: usize) -> String {
        match &self.outcome {
            Outcome::Cut { t_cut, cycle, removed, .. } => {
                let cycle = cycle.map(|c| format!(" (cycle {})", c)).unwrap_or_default();
                format!(
                    "Cut at t = {:.1}s{}: kept {} of {} samples, removed {} ({:.1}% of data)",
                    t_cut,
                    cycle,
                    self.len(),
                    total,
                    removed,
                    removed_fraction(*removed, total)
                )
            }
            Outcome::NoCut(reason) => format!(
                "No cut ({}): returning full dataset, kept all {} samples (0.0% removed)",
                reason.describe(),
                self.len()
            ),
        }
    }
}

pub(crate) fn validate_pair(t: &[f64], y: &[f64]) -> Result<()> {
    if t.len() != y.len() {
        return Err(TruncateError::InvalidInput(format!(
            "t and y must have equal length (got {} and {})",
            t.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Shift timestamps so the first one is zero.
pub(crate) fn rezero(t: &[f64]) -> Vec<f64> {
    match t.first() {
        Some(&t0) => t.iter().map(|&x| x - t0).collect(),
        None => Vec::new(),
    }
}

pub(crate) fn removed_fraction(removed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * removed as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pair() {
        assert!(validate_pair(&[0.0, 1.0], &[1.0, 2.0]).is_ok());
        assert!(validate_pair(&[], &[]).is_ok());
        assert!(matches!(
            validate_pair(&[0.0, 1.0], &[1.0]),
            Err(TruncateError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rezero() {
        assert_eq!(rezero(&[5.0, 6.5, 8.0]), vec![0.0, 1.5, 3.0]);
        assert!(rezero(&[]).is_empty());
    }

    #[test]
    fn test_outcome_helpers() {
        let cut = Outcome::Cut { index: 3, t_cut: 0.3, cycle: None, removed: 3 };
        assert!(cut.is_cut());
        assert!(!Outcome::NoCut(FallbackReason::NeverStabilized).is_cut());
        assert_eq!(removed_fraction(25, 100), 25.0);
        assert_eq!(removed_fraction(0, 0), 0.0);
    }

    #[test]
    fn test_summary_reports_branch_and_fraction() {
        let cut = Truncation {
            t: vec![0.0; 75],
            y: vec![0.0; 75],
            outcome: Outcome::Cut { index: 25, t_cut: 2.5, cycle: Some(2), removed: 25 },
        };
        assert_eq!(
            cut.summary(100),
            "Cut at t = 2.5s (cycle 2): kept 75 of 100 samples, removed 25 (25.0% of data)"
        );

        let full = Truncation {
            t: vec![0.0; 5],
            y: vec![0.0; 5],
            outcome: Outcome::NoCut(FallbackReason::InsufficientSamples),
        };
        let text = full.summary(5);
        assert!(text.starts_with("No cut (not enough samples)"));
        assert!(text.contains("0.0% removed"));
    }
}
