use anyhow::{Context, Result};
use log::{info, log, warn, Level};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::transient::{CutOverlay, CycleMeansPlot, DiagnosticsSink};

/// Writes plot data as CSV files into a directory and logs messages.
pub struct PlotWriter {
    dir: PathBuf,
    stem: String,
    written: Vec<PathBuf>,
}

impl PlotWriter {
    pub fn new<P: AsRef<Path>>(dir: P, stem: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            stem: stem.to_string(),
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&mut self, suffix: &str, header: &str, rows: impl Iterator<Item = String>) {
        let path = self.dir.join(format!("{}_{}.csv", self.stem, suffix));
        match write_rows(&path, header, rows) {
            Ok(()) => {
                info!("Plot data written to {}", path.display());
                self.written.push(path);
            }
            Err(e) => warn!("Failed to write plot data {}: {:#}", path.display(), e),
        }
    }
}

fn write_rows(path: &Path, header: &str, rows: impl Iterator<Item = String>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header)?;
    for row in rows {
        writeln!(out, "{}", row)?;
    }
    out.flush()?;
    Ok(())
}

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl DiagnosticsSink for PlotWriter {
    fn message(&mut self, level: Level, text: &str) {
        log!(level, "{}", text);
    }

    /// `t,raw,truncated`: truncated is blank before the cut and shares the
    /// raw time axis.
    fn cut_overlay(&mut self, overlay: &CutOverlay<'_>) {
        let skipped = overlay.t.len() - overlay.t_trunc.len();
        let rows = overlay.t.iter().zip(overlay.y).enumerate().map(|(i, (&t, &y))| {
            let kept = i.checked_sub(skipped).and_then(|j| overlay.y_trunc.get(j).copied());
            format!("{},{},{}", t, y, field(kept))
        });
        self.write("overlay", &format!("t,raw,truncated # cut @ {}s", overlay.t_cut), rows);
    }

    fn cycle_means(&mut self, plot: &CycleMeansPlot<'_>) {
        let rows = plot.means.iter().map(|m| {
            format!(
                "{},{},{},{},{},{},{}",
                m.cycle,
                m.mean,
                m.samples,
                plot.tail_mean,
                plot.band.0,
                plot.band.1,
                plot.cut_cycle.map_or(false, |k| m.cycle >= k)
            )
        });
        self.write(
            "cycle_means",
            "cycle,mean,samples,tail_mean,band_low,band_high,retained",
            rows,
        );
    }
}
