//! Boiler Dashboard CLI
//!
//! Command-line interface for the boiler connectivity and refresh controller.

use std::path::PathBuf;

use boiler_dashboard::{load_config, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "boiler-dashboard")]
#[command(about = "Connectivity and refresh controller for a home heating boiler")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mobile API base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Refresh once, print the dashboard snapshot as JSON and exit
    #[arg(long)]
    once: bool,

    /// Send a message to the boiler assistant, print the reply and exit
    #[arg(long, value_name = "MESSAGE")]
    chat: Option<String>,

    /// Print the AI maintenance report for the last HOURS (default 168) and exit
    #[arg(long, value_name = "HOURS", num_args = 0..=1, default_missing_value = "168")]
    maintenance_report: Option<u32>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, once={}, log_level={:?}",
        args.config,
        args.base_url,
        args.once,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    if let Some(message) = &args.chat {
        let reply = boiler_dashboard::send_chat(&config, message).await?;
        println!("{}", reply.response.response);
        return Ok(());
    }

    if let Some(hours) = args.maintenance_report {
        let report = boiler_dashboard::maintenance_report(&config, hours).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.once {
        let snapshot = boiler_dashboard::refresh_once(config).await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    tracing::info!("Starting boiler dashboard against {}", config.api.base_url);
    boiler_dashboard::run(config).await?;

    Ok(())
}
