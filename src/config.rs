use directories::ProjectDirs;
use knuffel::Decode;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mock::GeneratorSettings;
use crate::transient::{AmplitudeOptions, CycleOptions, Smoothing};

/// Settings read from `config.kdl`. Every node and property is optional;
/// anything missing keeps the built-in default.
#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermowaveConfig {
    #[knuffel(child)]
    pub amplitude: Option<AmplitudeConfig>,
    #[knuffel(child)]
    pub cycle: Option<CycleConfig>,
    #[knuffel(child)]
    pub generator: Option<GeneratorConfig>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeConfig {
    #[knuffel(property)]
    pub window: Option<u64>,
    #[knuffel(property)]
    pub tol: Option<f64>,
    #[knuffel(property)]
    pub legacy_smoothing: Option<bool>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    #[knuffel(property)]
    pub period: Option<f64>,
    #[knuffel(property)]
    pub n_tail_cycles: Option<u64>,
    #[knuffel(property)]
    pub frac_tol: Option<f64>,
    #[knuffel(property)]
    pub min_points_per_cycle: Option<u64>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[knuffel(property)]
    pub runs: Option<u64>,
    #[knuffel(property)]
    pub thermistors: Option<u64>,
    #[knuffel(property)]
    pub spacing_mm: Option<f64>,
    #[knuffel(property)]
    pub diffusivity: Option<f64>,
    #[knuffel(property)]
    pub duration: Option<f64>,
    #[knuffel(property)]
    pub sample_rate: Option<f64>,
    #[knuffel(property)]
    pub noise_std: Option<f64>,
    #[knuffel(property)]
    pub baseline: Option<f64>,
    #[knuffel(property)]
    pub amplitude: Option<f64>,
    #[knuffel(property)]
    pub transient_offset: Option<f64>,
    #[knuffel(property)]
    pub transient_decay: Option<f64>,
    #[knuffel(arguments)]
    pub periods: Vec<f64>,
}

impl ThermowaveConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(name: &str, content: &str) -> anyhow::Result<Self> {
        let config = knuffel::parse(name, content)?;
        Ok(config)
    }

    /// `--config` if given, else `config.kdl` in the user config directory
    /// if it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn amplitude_options(&self) -> AmplitudeOptions {
        let mut options = AmplitudeOptions::default();
        if let Some(c) = &self.amplitude {
            if let Some(window) = c.window {
                options.window = window as usize;
            }
            if let Some(tol) = c.tol {
                options.tol = tol;
            }
            if c.legacy_smoothing == Some(true) {
                options.smoothing = Smoothing::Legacy;
            }
        }
        options
    }

    pub fn cycle_options(&self) -> CycleOptions {
        let mut options = CycleOptions::default();
        if let Some(c) = &self.cycle {
            options.period = c.period;
            if let Some(n) = c.n_tail_cycles {
                options.n_tail_cycles = n as usize;
            }
            if let Some(tol) = c.frac_tol {
                options.frac_tol = tol;
            }
            if let Some(n) = c.min_points_per_cycle {
                options.min_points_per_cycle = n as usize;
            }
        }
        options
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        let mut settings = GeneratorSettings::default();
        let Some(c) = &self.generator else {
            return settings;
        };
        if !c.periods.is_empty() {
            settings.periods = c.periods.clone();
        }
        if let Some(runs) = c.runs {
            settings.runs = runs as usize;
        }
        if let Some(n) = c.thermistors {
            settings.thermistors = n as usize;
        }
        let overrides = [
            (c.spacing_mm, &mut settings.spacing_mm),
            (c.diffusivity, &mut settings.diffusivity),
            (c.duration, &mut settings.duration),
            (c.sample_rate, &mut settings.sample_rate),
            (c.noise_std, &mut settings.noise_std),
            (c.baseline, &mut settings.baseline),
            (c.amplitude, &mut settings.amplitude),
            (c.transient_offset, &mut settings.transient_offset),
            (c.transient_decay, &mut settings.transient_decay),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
        settings
    }
}

pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "thermowave", "thermowave").map(|d| d.config_dir().join("config.kdl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
amplitude window=300 tol=0.05 legacy-smoothing=true
cycle n-tail-cycles=4 frac-tol=0.02
generator 10.0 20.0 runs=1 noise-std=0.0 transient-offset=3.0
"#;

    #[test]
    fn test_parse_config() {
        let config = ThermowaveConfig::parse("config.kdl", SAMPLE).unwrap();

        let amplitude = config.amplitude_options();
        assert_eq!(amplitude.window, 300);
        assert_eq!(amplitude.tol, 0.05);
        assert_eq!(amplitude.smoothing, Smoothing::Legacy);

        let cycle = config.cycle_options();
        assert_eq!(cycle.period, None);
        assert_eq!(cycle.n_tail_cycles, 4);
        assert_eq!(cycle.frac_tol, 0.02);
        assert_eq!(cycle.min_points_per_cycle, 20);

        let generator = config.generator_settings();
        assert_eq!(generator.periods, vec![10.0, 20.0]);
        assert_eq!(generator.runs, 1);
        assert_eq!(generator.noise_std, 0.0);
        assert_eq!(generator.transient_offset, 3.0);
        assert_eq!(generator.thermistors, 8);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ThermowaveConfig::parse("config.kdl", "").unwrap();
        assert_eq!(config, ThermowaveConfig::default());
        assert_eq!(config.amplitude_options(), AmplitudeOptions::default());
        assert_eq!(config.cycle_options(), CycleOptions::default());
        assert_eq!(config.generator_settings(), GeneratorSettings::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(ThermowaveConfig::parse("config.kdl", "amplitude window=\"wide\"").is_err());
    }
}
