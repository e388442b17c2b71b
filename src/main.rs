// src/main.rs - Endstop host entry point
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;

use endstop_host::config::{self, Config, ConfigError};
use endstop_host::endstop_wait::{DwellPolicy, EndstopWaiter, WaitError, WaitRequest};
use endstop_host::hardware::{EndstopRegistry, EndstopResolver};
use endstop_host::host_os::PrinterHost;
use endstop_host::scheduler::TokioReactor;

#[derive(Debug, Parser)]
#[command(name = "endstop-host", version, about = "Wait for printer endstops to reach a state")]
struct Cli {
    /// Path to the host configuration
    #[arg(short, long, default_value = "printer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query an endstop until it is triggered or not triggered
    Wait {
        /// Name of the endstop to query
        #[arg(long)]
        endstop: String,
        /// Desired state, 0 or 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
        triggered: u8,
        /// Number of samples (0.1s apart); queries every second without limit if omitted
        #[arg(long, value_parser = clap::value_parser!(NonZeroU32))]
        attempts: Option<NonZeroU32>,
    },
    /// Print the last known state of every queried endstop
    Status,
    /// List configured endstops
    List,
}

#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
            tracing::error!("Failed to load config from '{}': {}", cli.config.display(), e);
            tracing::error!("Please ensure the configuration file exists and is properly formatted");
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level())
        .init();

    tracing::info!("Starting endstop host");
    tracing::info!("Host: {}", config.host.name.as_deref().unwrap_or("Unknown"));

    run(cli.command, config).await.map_err(|e| {
        tracing::error!("{}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })
}

async fn run(command: Command, config: Config) -> Result<(), CommandError> {
    let registry = Arc::new(EndstopRegistry::from_config(&config.endstops));
    let host = Arc::new(PrinterHost::new(config.host.initial_state, config.host.liveness));
    tracing::info!("Host state: {:?} (liveness: {:?})", host.state(), host.policy());
    if registry.is_empty() {
        tracing::warn!("No endstops configured");
    } else {
        tracing::info!("Loaded {} endstops", registry.len());
    }
    let waiter = EndstopWaiter::new(registry.clone(), Arc::new(TokioReactor::new()), host.clone())
        .with_dwell(DwellPolicy::from(&config.wait));

    match command {
        Command::Wait { endstop, triggered, attempts } => {
            let shutdown_host = host.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    shutdown_host.request_shutdown("interrupted");
                }
            });

            let request = WaitRequest::new(endstop, triggered == 1, attempts);
            tracing::info!(
                "Waiting for endstop '{}' to be {} ({})",
                request.endstop,
                if request.triggered { "triggered" } else { "not triggered" },
                match request.max_attempts {
                    Some(n) => format!("{} attempts", n),
                    None => "continuously".to_string(),
                }
            );
            let outcome = waiter.wait_for_state(&request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            println!("{}", serde_json::to_string_pretty(&waiter.get_status())?);
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&waiter.get_status())?);
        }
        Command::List => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
