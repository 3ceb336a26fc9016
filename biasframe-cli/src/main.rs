//! biasframe CLI — runs one experiment from a YAML config.
//!
//! The config is deep-merged over the built-in base; the resolved config,
//! per-partition reports, predictions, and training history land in
//! `output_dir`.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use biasframe_core::{MajorityBaseline, load_config, run_experiment};

/// Train and evaluate a joint offensiveness classifier / bias-frame generator
#[derive(Parser, Debug)]
#[command(name = "biasframe", version, about, long_about = None)]
struct Cli {
    /// Experiment configuration (YAML), merged over the base config
    config: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Config problems surface before any logging, data, or model setup.
    let conf = load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    std::fs::create_dir_all(&conf.output_dir)
        .with_context(|| format!("creating output dir {}", conf.output_dir.display()))?;

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = conf.output_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "biasframe.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let mut model = MajorityBaseline::new();
    let summary = run_experiment(&conf, &mut model).context("experiment failed")?;

    for (prefix, report) in &summary.reports {
        println!("== {prefix} ==");
        print!("{}", report.format());
    }
    tracing::info!(
        config = %summary.config_path.display(),
        best_epoch = ?summary.history.best_epoch,
        "Run complete"
    );

    println!("Done!");
    Ok(())
}
