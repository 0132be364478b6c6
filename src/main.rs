use clap::Parser;
use gh_harvest::harvest::HarvestPipeline;
use gh_harvest::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Harvest GitHub contributor statistics for the projects listed in a library catalog.
#[derive(Parser, Debug)]
#[command(name = "gh-harvest", version, about)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "GH_HARVEST_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn initialize_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr; stdout is left for the summary line.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_tracing(cli.verbose);

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), "{e}");
            return ExitCode::FAILURE;
        }
    };
    info!(config = ?config, "Config loaded");

    let pipeline = match HarvestPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run().await {
        Ok(result) => {
            println!(
                "Wrote {} projects ({} failed) to {}",
                result.report.projects.len(),
                result.stats.projects_failed,
                result.report_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
