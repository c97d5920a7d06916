//! `lexigram` binary: initializes `tracing` per the resolved log format,
//! parses [`lexigram_cli::Cli`], and dispatches to the Runner or the
//! duplicate-function scan.
//!
//! Exit codes (§7): `0` on success, `1` when a fatal error surfaces (a
//! `lexigram_common::CoreError` or any other propagated `anyhow::Error`),
//! `2` on a CLI usage error (handled by `clap` itself before `main` runs).

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use lexigram_cli::{cli::Commands, duplicates, pipeline, Cli, LogFormat, RunnerConfig};

fn verbosity_filter(verbose: u8) -> EnvFilter {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_tracing(format: LogFormat, verbose: u8) {
    let filter = verbosity_filter(verbose);
    match format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().json().with_env_filter(filter).init();
        }
        LogFormat::Tree => {
            Registry::default()
                .with(filter)
                .with(tracing_tree::HierarchicalLayer::new(2))
                .init();
        }
    }
}

/// Dispatches to the Runner or the duplicate-function scan.
fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze { project_path, config } => {
            let config = RunnerConfig::resolve(config, cli.config.as_deref())?;
            let outcome = pipeline::run_single(&project_path, &config)?;
            if let Some(report) = outcome.report {
                println!("{}", report.render());
            } else {
                println!("analysis skipped (do_analysis_run=false); count model built for {} module(s)", outcome.count_model.sequences().len());
            }
        }
        Commands::Sweep { project_path, config } => {
            let config = RunnerConfig::resolve(config, cli.config.as_deref())?;
            let outcome = pipeline::run_sweep(&project_path, &config)?;
            println!("wrote {} report(s) to {}", outcome.report_paths.len(), outcome.result_folder.display());
        }
        Commands::Duplicates { project_path } => {
            let groups = duplicates::find_duplicate_functions(&project_path);
            print!("{}", duplicates::render_duplicate_report(&groups));
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_format = cli.log_format.unwrap_or_default();
    init_tracing(log_format, cli.verbose);

    run(cli)
}
