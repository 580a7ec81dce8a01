//! `rill`: replay reactive sequence scenarios from the command line.

use anyhow::Result;
use clap::Parser;
use rill_core::SequenceEngine;
use std::path::PathBuf;

mod config;
mod scenarios;

use config::CliConfig;
use scenarios::Scenario;

#[derive(Parser)]
#[command(name = "rill")]
#[command(about = "Run reactive sequence operator scenarios", long_about = None)]
struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, default_value = "rill.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(&cli.config)?;
    if cli.verbose {
        config.engine.log_level = "debug".to_string();
    }
    rill_core::logging::init(&config.engine)?;

    let engine = SequenceEngine::tokio(config.engine.clone());
    tracing::debug!(?engine, "engine ready");

    scenarios::run(cli.scenario, &engine, &config).await
}
