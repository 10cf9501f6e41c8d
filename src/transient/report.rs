use log::{debug, log, Level};

use crate::transient::cycle::CycleMean;

/// Raw signal, cut line and retained region of a finished cut.
pub struct CutOverlay<'a> {
    pub t: &'a [f64],
    pub y: &'a [f64],
    pub t_cut: f64,
    /// Retained samples on the re-zeroed time axis.
    pub t_trunc: &'a [f64],
    pub y_trunc: &'a [f64],
}

/// Cycle means together with the tail reference used to judge them.
pub struct CycleMeansPlot<'a> {
    pub means: &'a [CycleMean],
    pub tail_mean: f64,
    pub band: (f64, f64),
    pub cut_cycle: Option<usize>,
}

/// Receiver for the presentational side effects of a truncation.
///
/// Nothing a sink does can change the returned arrays. Every hook defaults
/// to doing nothing.
pub trait DiagnosticsSink {
    fn message(&mut self, _level: Level, _text: &str) {}

    fn cut_overlay(&mut self, _overlay: &CutOverlay<'_>) {}

    fn cycle_means(&mut self, _plot: &CycleMeansPlot<'_>) {}
}

/// Discards everything.
pub struct NullSink;

impl DiagnosticsSink for NullSink {}

/// Forwards messages to the `log` facade and summarises plots at debug level.
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn message(&mut self, level: Level, text: &str) {
        log!(level, "{}", text);
    }

    fn cut_overlay(&mut self, overlay: &CutOverlay<'_>) {
        debug!(
            "Cut overlay: {} raw samples, cut @ {:.1}s, {} retained",
            overlay.t.len(),
            overlay.t_cut,
            overlay.t_trunc.len()
        );
    }

    fn cycle_means(&mut self, plot: &CycleMeansPlot<'_>) {
        debug!(
            "Cycle means: {} cycles, tail mean {:.4}, band [{:.4}, {:.4}], cut cycle {:?}",
            plot.means.len(),
            plot.tail_mean,
            plot.band.0,
            plot.band.1,
            plot.cut_cycle
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Keeps what it is given so tests can inspect diagnostics.
    #[derive(Default)]
    pub struct RecordingSink {
        pub messages: Vec<(Level, String)>,
        pub overlays: Vec<(f64, usize)>,
        pub cycle_plots: Vec<(Vec<CycleMean>, f64, (f64, f64), Option<usize>)>,
    }

    impl DiagnosticsSink for RecordingSink {
        fn message(&mut self, level: Level, text: &str) {
            self.messages.push((level, text.to_string()));
        }

        fn cut_overlay(&mut self, overlay: &CutOverlay<'_>) {
            self.overlays.push((overlay.t_cut, overlay.t_trunc.len()));
        }

        fn cycle_means(&mut self, plot: &CycleMeansPlot<'_>) {
            self.cycle_plots
                .push((plot.means.to_vec(), plot.tail_mean, plot.band, plot.cut_cycle));
        }
    }
}
