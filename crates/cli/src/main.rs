//! Command Line Interface for the DLMM liquidity agent.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod agent;
mod config;
mod status;

use agent::Services;
use config::AgentConfig;

#[derive(Parser)]
#[command(name = "dlmm-lp")]
#[command(about = "Range-following liquidity agent for Meteora DLMM pools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the position until interrupted (default)
    Run,
    /// Print balances, the active bin and open positions, then exit
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::from_env().context("invalid configuration")?;
    info!(config = ?config, "Loaded configuration");
    let services = Services::connect(&config).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let scheduler = services.scheduler(&config);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
            };
            scheduler
                .run(shutdown)
                .await
                .context("agent stopped on a startup failure")?;
            info!("Agent stopped");
        }
        Commands::Status => status::print_status(&config, &services).await?,
    }

    Ok(())
}
