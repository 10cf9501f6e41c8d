use log::{debug, Level};
use serde::{Deserialize, Serialize};

use crate::comments::period_from_comments;
use crate::error::{Result, TruncateError};
use crate::transient::report::{CycleMeansPlot, DiagnosticsSink};
use crate::transient::{removed_fraction, rezero, validate_pair, FallbackReason, Outcome, Truncation};
use crate::util::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOptions {
    /// Driving period in seconds. Read from `comments` when absent.
    pub period: Option<f64>,
    pub comments: Option<String>,
    pub n_tail_cycles: usize,
    pub frac_tol: f64,
    pub min_points_per_cycle: usize,
    pub plot: bool,
    pub verbose: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            period: None,
            comments: None,
            n_tail_cycles: 5,
            frac_tol: 0.01,
            min_points_per_cycle: 20,
            plot: false,
            verbose: true,
        }
    }
}

impl CycleOptions {
    pub fn with_period(period: f64) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }

    pub fn with_comments(comments: impl Into<String>) -> Self {
        Self {
            comments: Some(comments.into()),
            ..Default::default()
        }
    }

    /// Explicit period if given, otherwise the one recorded in the comments.
    pub fn resolve_period(&self) -> Result<f64> {
        let period = match (self.period, self.comments.as_deref()) {
            (Some(p), _) => p,
            (None, Some(comments)) => period_from_comments(comments)?,
            (None, None) => return Err(TruncateError::MissingPeriod),
        };
        if !period.is_finite() || period <= 0.0 {
            return Err(TruncateError::InvalidInput(format!(
                "period must be positive, got {}",
                period
            )));
        }
        Ok(period)
    }

    fn validate(&self) -> Result<()> {
        if self.n_tail_cycles == 0 {
            return Err(TruncateError::InvalidInput("n_tail_cycles must be at least 1".to_string()));
        }
        if self.min_points_per_cycle == 0 {
            return Err(TruncateError::InvalidInput(
                "min_points_per_cycle must be at least 1".to_string(),
            ));
        }
        if !self.frac_tol.is_finite() || self.frac_tol < 0.0 {
            return Err(TruncateError::InvalidInput(format!(
                "frac_tol must be a non-negative number, got {}",
                self.frac_tol
            )));
        }
        Ok(())
    }
}

/// Mean of one well-sampled cycle. Under-sampled cycles have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleMean {
    pub cycle: usize,
    pub mean: f64,
    pub samples: usize,
}

/// Cycle index of every sample, counted in whole periods from `t[0]`.
///
/// A span too long to count in `usize` cycles is rejected rather than
/// clamped into one cycle.
pub fn cycle_indices(t: &[f64], period: f64) -> Result<Vec<usize>> {
    let t0 = match t.first() {
        Some(&t0) => t0,
        None => return Ok(Vec::new()),
    };
    t.iter()
        .map(|&ti| {
            let cycle = ((ti - t0) / period).floor().max(0.0);
            if cycle.is_finite() && cycle < usize::MAX as f64 {
                Ok(cycle as usize)
            } else {
                Err(TruncateError::InvalidInput(format!(
                    "time span {}s is too long for a period of {}s",
                    ti - t0,
                    period
                )))
            }
        })
        .collect()
}

/// Per-cycle means in cycle order, skipping cycles with fewer than
/// `min_points` samples. `cycles` must be non-decreasing.
pub fn cycle_means(cycles: &[usize], y: &[f64], min_points: usize) -> Vec<CycleMean> {
    let mut means = Vec::new();
    let mut start = 0;
    while start < cycles.len() {
        let cycle = cycles[start];
        let end = start + cycles[start..].iter().take_while(|&&c| c == cycle).count();
        let samples = end - start;
        if samples >= min_points {
            means.push(CycleMean {
                cycle,
                mean: mean(&y[start..end]),
                samples,
            });
        }
        start = end;
    }
    means
}

/// Closed tolerance band around `reference`, ordered low to high.
pub fn steady_band(reference: f64, frac_tol: f64) -> (f64, f64) {
    let a = (1.0 - frac_tol) * reference;
    let b = (1.0 + frac_tol) * reference;
    (a.min(b), a.max(b))
}

/// Position in `means` of the earliest entry from which every later mean
/// lies inside `band`.
pub fn earliest_steady_suffix(means: &[CycleMean], band: (f64, f64)) -> Option<usize> {
    let inside = |m: &CycleMean| m.mean >= band.0 && m.mean <= band.1;
    let outside_tail = means.iter().rev().take_while(|&m| inside(m)).count();
    if outside_tail == 0 {
        None
    } else {
        Some(means.len() - outside_tail)
    }
}

/// Remove the initial transient by finding the first cycle after which every
/// cycle mean stays near the mean of the last `n_tail_cycles` cycles.
///
/// Shape and period problems are errors. Too little data or a signal that
/// never settles returns the whole series, re-zeroed, with
/// [`Outcome::NoCut`].
pub fn remove_transient(
    t: &[f64],
    y: &[f64],
    options: &CycleOptions,
    sink: &mut dyn DiagnosticsSink,
) -> Result<Truncation> {
    validate_pair(t, y)?;
    if t.iter().any(|v| !v.is_finite()) {
        return Err(TruncateError::InvalidInput("timestamps must be finite".to_string()));
    }
    if t.windows(2).any(|w| w[1] < w[0]) {
        return Err(TruncateError::InvalidInput("timestamps must be non-decreasing".to_string()));
    }
    options.validate()?;
    let period = options.resolve_period()?;
    debug!("Cycle truncation with period {}s over {} samples", period, t.len());

    let n = t.len();
    if n == 0 || n < options.min_points_per_cycle {
        return Ok(fallback(t, y, FallbackReason::InsufficientSamples, options, sink));
    }

    let cycles = cycle_indices(t, period)?;
    // `n_cycles <= n_tail_cycles + 1` without the additions.
    let last_cycle = cycles.last().copied().unwrap_or(0);
    let n_cycles = last_cycle.saturating_add(1);
    if last_cycle <= options.n_tail_cycles {
        debug!(
            "{} cycles, need more than {}",
            n_cycles,
            options.n_tail_cycles.saturating_add(1)
        );
        return Ok(fallback(t, y, FallbackReason::TooFewCycles, options, sink));
    }

    let means = cycle_means(&cycles, y, options.min_points_per_cycle);
    if means.len() <= options.n_tail_cycles {
        debug!("{} well-sampled cycles of {}", means.len(), n_cycles);
        return Ok(fallback(t, y, FallbackReason::TooFewWellSampledCycles, options, sink));
    }

    let tail: Vec<f64> = means[means.len() - options.n_tail_cycles..]
        .iter()
        .map(|m| m.mean)
        .collect();
    let tail_mean = mean(&tail);
    let band = steady_band(tail_mean, options.frac_tol);
    debug!("Tail mean {:.5}, band [{:.5}, {:.5}]", tail_mean, band.0, band.1);

    let cut_cycle = earliest_steady_suffix(&means, band).map(|pos| means[pos].cycle);
    if options.plot {
        sink.cycle_means(&CycleMeansPlot {
            means: &means,
            tail_mean,
            band,
            cut_cycle,
        });
    }

    let k_cut = match cut_cycle {
        Some(k) => k,
        None => return Ok(fallback(t, y, FallbackReason::NeverStabilized, options, sink)),
    };

    // Under-sampled cycles past the cut are kept.
    let Some(index) = cycles.iter().position(|&c| c >= k_cut) else {
        return Ok(fallback(t, y, FallbackReason::NeverStabilized, options, sink));
    };
    let t_cut = t[index];
    let t_trunc = rezero(&t[index..]);
    let y_trunc = y[index..].to_vec();

    if options.verbose {
        sink.message(
            Level::Info,
            &format!(
                "Steady state from cycle {} (t ≈ {:.1}s): {} samples removed, {:.1}% of data.",
                k_cut,
                t_cut,
                index,
                removed_fraction(index, n)
            ),
        );
    }

    Ok(Truncation {
        t: t_trunc,
        y: y_trunc,
        outcome: Outcome::Cut {
            index,
            t_cut,
            cycle: Some(k_cut),
            removed: index,
        },
    })
}

fn fallback(
    t: &[f64],
    y: &[f64],
    reason: FallbackReason,
    options: &CycleOptions,
    sink: &mut dyn DiagnosticsSink,
) -> Truncation {
    if options.verbose {
        sink.message(
            Level::Warn,
            &format!("Cycle truncation: {}, returning full dataset.", reason.describe()),
        );
    }
    Truncation {
        t: rezero(t),
        y: y.to_vec(),
        outcome: Outcome::NoCut(reason),
    }
}
