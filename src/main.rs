use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process;
use thermowave::args::{Cli, Commands, GenerateArgs, Method, TruncateArgs};
use thermowave::config::ThermowaveConfig;
use thermowave::dataset::{load_dataset, save_series};
use thermowave::mock;
use thermowave::plot::PlotWriter;
use thermowave::transient::{remove_transient, truncate_transient, DiagnosticsSink, LogSink};

fn main() {
    // Truncation diagnostics are logged at info; `--quiet` or RUST_LOG silences them.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ThermowaveConfig::discover(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Truncate(args) => truncate(&args, &config),
        Commands::Generate(args) => generate(&args, &config),
    }
}

fn truncate(args: &TruncateArgs, config: &ThermowaveConfig) -> Result<()> {
    let dataset = load_dataset(&args.file)?;
    let y = dataset.channel(args.channel)?;

    let mut plot_writer = match &args.plot_dir {
        Some(dir) => {
            let stem = args
                .file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "series".to_string());
            Some(PlotWriter::new(dir, &stem)?)
        }
        None => None,
    };
    let mut log_sink = LogSink;
    let sink: &mut dyn DiagnosticsSink = match plot_writer.as_mut() {
        Some(writer) => writer,
        None => &mut log_sink,
    };

    let result = match args.method {
        Method::Amplitude => {
            let options = args.amplitude_options(config);
            truncate_transient(&dataset.timestamp, y, &options, sink)
        }
        Method::Cycle => {
            let options = args.cycle_options(config, &dataset.comments);
            remove_transient(&dataset.timestamp, y, &options, sink)
        }
    }
    .with_context(|| format!("Failed to truncate {}", args.file.display()))?;

    println!("{}", result.summary(dataset.len()));

    if let Some(path) = &args.output {
        save_series(path, &result.t, &result.y)?;
    }
    Ok(())
}

fn generate(args: &GenerateArgs, config: &ThermowaveConfig) -> Result<()> {
    let mut settings = config.generator_settings();
    if !args.periods.is_empty() {
        settings.periods = args.periods.clone();
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let files = mock::generate(&args.output_dir, &settings, &mut rng)
        .context("Failed to generate mock data")?;
    println!("Created files:");
    for path in files {
        println!("   {}", path.display());
    }
    Ok(())
}
