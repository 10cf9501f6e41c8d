//! Synthetic datasets in the instrument's file format.
//!
//! Each thermistor sees a damped plane thermal wave,
//! `T0 + A0·exp(-k x)·sin(ωt - k x)` with `k = sqrt(ω / 2D)`, plus Gaussian
//! noise and an optional decaying warm-up offset.

use anyhow::{Context, Result};
use log::{debug, info};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use crate::dataset::{save_dataset, Dataset};
use crate::util::arange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Driving periods in seconds.
    pub periods: Vec<f64>,
    pub runs: usize,
    pub thermistors: usize,
    /// Thermistor spacing in mm.
    pub spacing_mm: f64,
    /// Thermal diffusivity in mm²/s.
    pub diffusivity: f64,
    pub duration: f64,
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    pub noise_std: f64,
    pub baseline: f64,
    /// Wave amplitude at the first thermistor.
    pub amplitude: f64,
    /// Initial offset of the warm-up transient; zero disables it.
    pub transient_offset: f64,
    /// Decay time of the warm-up transient in seconds.
    pub transient_decay: f64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            periods: vec![10.0, 15.0, 20.0, 30.0, 60.0],
            runs: 3,
            thermistors: 8,
            spacing_mm: 5.0,
            diffusivity: 35.0,
            duration: 600.0,
            sample_rate: 10.0,
            noise_std: 0.1,
            baseline: 20.0,
            amplitude: 2.0,
            transient_offset: 0.0,
            transient_decay: 30.0,
        }
    }
}

impl GeneratorSettings {
    pub fn timestamps(&self) -> Vec<f64> {
        arange(0.0, self.duration, 1.0 / self.sample_rate)
    }

    fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0 && self.duration > 0.0 && self.diffusivity > 0.0) {
            anyhow::bail!("Sample rate, duration and diffusivity must be positive");
        }
        if self.periods.iter().any(|&p| !(p > 0.0)) {
            anyhow::bail!("Periods must be positive: {:?}", self.periods);
        }
        if self.noise_std < 0.0 || self.transient_decay <= 0.0 {
            anyhow::bail!("Noise must be non-negative and the transient decay positive");
        }
        Ok(())
    }
}

/// Temperature series at `x_mm` from the heater for a drive of `period`.
pub fn thermal_wave<R: Rng + ?Sized>(
    t: &[f64],
    period: f64,
    x_mm: f64,
    settings: &GeneratorSettings,
    rng: &mut R,
) -> Vec<f64> {
    let omega = 2.0 * PI / period;
    let k = (omega / (2.0 * settings.diffusivity)).sqrt();
    let amplitude = settings.amplitude * (-k * x_mm).exp();
    let phase = -k * x_mm;
    let noise = Normal::new(0.0, settings.noise_std).ok();

    t.iter()
        .map(|&ti| {
            let warmup = settings.transient_offset * (-ti / settings.transient_decay).exp();
            let jitter = noise.as_ref().map_or(0.0, |n| n.sample(rng));
            settings.baseline + warmup + amplitude * (omega * ti + phase).sin() + jitter
        })
        .collect()
}

pub fn mock_dataset<R: Rng + ?Sized>(period: f64, settings: &GeneratorSettings, rng: &mut R) -> Dataset {
    let t = settings.timestamps();
    let thermistors = (0..settings.thermistors)
        .map(|i| thermal_wave(&t, period, i as f64 * settings.spacing_mm, settings, rng))
        .collect();

    Dataset {
        output_voltage: vec![0.0; t.len()],
        output_current: vec![0.0; t.len()],
        timestamp: t,
        thermistors,
        comments: format!("Period = {:?}", period),
    }
}

pub fn mock_file_name(period: f64, run: usize) -> String {
    format!("thermal_mock_T{}s_run{}.csv", period as i64, run)
}

/// Write `runs` files per period into `dir`, returning their paths.
pub fn generate<P: AsRef<Path>, R: Rng + ?Sized>(
    dir: P,
    settings: &GeneratorSettings,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    settings.validate()?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut created = Vec::new();
    for &period in &settings.periods {
        for run in 1..=settings.runs {
            let dataset = mock_dataset(period, settings, rng);
            let path = dir.join(mock_file_name(period, run));
            save_dataset(&path, &dataset)?;
            debug!("Period {}s run {}: {} samples", period, run, dataset.len());
            created.push(path);
        }
    }

    info!("Created {} mock datasets in {}", created.len(), dir.display());
    Ok(created)
}
