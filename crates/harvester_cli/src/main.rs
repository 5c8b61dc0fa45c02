//! harvestd - the harvest collection daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harvestd")]
#[command(version)]
#[command(about = "Repository metadata and working-tree collection daemon")]
#[command(
    long_about = "harvestd continuously crawls repository hosting platforms for repository \
and contributor metadata, records it in a relational store, and maintains an \
on-disk working copy of every recorded repository by cloning new ones and \
fast-forwarding existing ones."
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', value_name = "PATH")]
    config: PathBuf,

    /// Disable the metadata crawlers
    #[arg(long)]
    disable_crawlers: bool,

    /// Disable the repositories fetcher
    #[arg(long)]
    disable_fetcher: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("harvester=info,harvester_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = match harvester::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let options = harvester::DaemonOptions {
        disable_crawlers: cli.disable_crawlers,
        disable_fetcher: cli.disable_fetcher,
    };

    match harvester::daemon::run(config, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "daemon failed");
            ExitCode::FAILURE
        }
    }
}
