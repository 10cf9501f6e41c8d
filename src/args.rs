use crate::config::ThermowaveConfig;
use crate::dataset::Channel;
use crate::transient::{AmplitudeOptions, CycleOptions, Smoothing};
use crate::util::{channel_parser, positive_parser};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Steady-state extraction for driven thermal-wave measurements.")]
pub struct Cli {
    /// KDL config file (defaults to config.kdl in the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove the initial transient from one channel of a dataset.
    Truncate(TruncateArgs),
    /// Write synthetic datasets in the instrument format.
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Rolling RMS amplitude envelope.
    Amplitude,
    /// Per-cycle means against a tail reference.
    Cycle,
}

#[derive(Args)]
pub struct TruncateArgs {
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = Method::Cycle)]
    pub method: Method,
    /// voltage, current or a thermistor index.
    #[arg(long, default_value = "0", value_parser = channel_parser)]
    pub channel: Channel,
    #[arg(long)]
    pub window: Option<usize>,
    #[arg(long)]
    pub tol: Option<f64>,
    #[arg(long)]
    pub legacy_smoothing: bool,
    /// Driving period in seconds; read from the file comments when omitted.
    #[arg(long, value_parser = positive_parser)]
    pub period: Option<f64>,
    #[arg(long)]
    pub n_tail_cycles: Option<usize>,
    #[arg(long)]
    pub frac_tol: Option<f64>,
    #[arg(long)]
    pub min_points_per_cycle: Option<usize>,
    /// Write the truncated series as `t,y` CSV.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Write plot data CSVs into this directory.
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(long, default_value = "mock_data")]
    pub output_dir: PathBuf,
    /// Seed for reproducible noise.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Driving periods in seconds, overriding the config.
    #[arg(long, value_delimiter = ',', value_parser = positive_parser)]
    pub periods: Vec<f64>,
}

impl TruncateArgs {
    pub fn amplitude_options(&self, config: &ThermowaveConfig) -> AmplitudeOptions {
        let mut options = config.amplitude_options();
        if let Some(window) = self.window {
            options.window = window;
        }
        if let Some(tol) = self.tol {
            options.tol = tol;
        }
        if self.legacy_smoothing {
            options.smoothing = Smoothing::Legacy;
        }
        options.plot = self.plot_dir.is_some();
        options.verbose = !self.quiet;
        options
    }

    pub fn cycle_options(&self, config: &ThermowaveConfig, comments: &str) -> CycleOptions {
        let mut options = config.cycle_options();
        if self.period.is_some() {
            options.period = self.period;
        }
        options.comments = Some(comments.to_string());
        if let Some(n) = self.n_tail_cycles {
            options.n_tail_cycles = n;
        }
        if let Some(tol) = self.frac_tol {
            options.frac_tol = tol;
        }
        if let Some(n) = self.min_points_per_cycle {
            options.min_points_per_cycle = n;
        }
        options.plot = self.plot_dir.is_some();
        options.verbose = !self.quiet;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> TruncateArgs {
        match Cli::parse_from(args).command {
            Commands::Truncate(a) => a,
            Commands::Generate(_) => panic!("expected truncate"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&["thermowave", "truncate", "run.csv", "--method", "amplitude", "--window", "200", "-q"]);
        assert_eq!(args.method, Method::Amplitude);
        let config = ThermowaveConfig::parse("config.kdl", "amplitude window=300 tol=0.05").unwrap();
        let options = args.amplitude_options(&config);
        assert_eq!(options.window, 200);
        assert_eq!(options.tol, 0.05);
        assert!(!options.verbose);
        assert!(!options.plot);
    }

    #[test]
    fn test_cycle_options_carry_comments() {
        let args = parse(&["thermowave", "truncate", "run.csv", "--channel", "therm_2", "--frac-tol", "0.02"]);
        assert_eq!(args.method, Method::Cycle);
        assert_eq!(args.channel, Channel::Thermistor(2));
        let options = args.cycle_options(&ThermowaveConfig::default(), "Period = 15.0");
        assert_eq!(options.resolve_period(), Ok(15.0));
        assert_eq!(options.frac_tol, 0.02);
        assert_eq!(options.n_tail_cycles, 5);
    }

    #[test]
    fn test_generate_periods() {
        let cli = Cli::parse_from(["thermowave", "generate", "--periods", "10,20.5", "--seed", "3"]);
        match cli.command {
            Commands::Generate(g) => {
                assert_eq!(g.periods, vec![10.0, 20.5]);
                assert_eq!(g.seed, Some(3));
            }
            Commands::Truncate(_) => panic!("expected generate"),
        }
        assert!(Cli::try_parse_from(["thermowave", "generate", "--periods", "0"]).is_err());
    }
}
