//! Wheelbase server - main application entry point

use anyhow::{Context, Result};
use clap::Parser;
use config::ConfigLoader;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod scheduler;

use app::Application;

#[derive(Parser)]
#[command(name = "wheelbase", about = "Booking and settlement engine for the Wheelbase marketplace")]
struct Args {
    /// Path to the YAML configuration file (falls back to CONFIG_PATH,
    /// then config.yaml)
    #[arg(long)]
    config: Option<String>,

    /// Write an example configuration file to the given path and exit
    #[arg(long)]
    write_example_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env file if it exists
    if let Err(e) = dotenv::dotenv() {
        // Only warn if the error is not "file not found"
        if !e.to_string().contains("No such file or directory") {
            warn!("Could not load .env file: {}", e);
        }
    }

    // Initialize logging
    init_logging()?;

    if let Some(path) = args.write_example_config {
        ConfigLoader::create_example(&path)
            .context("Failed to write example configuration")?;
        info!("Example configuration written to {}", path);
        return Ok(());
    }

    info!("Starting Wheelbase v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = args
        .config
        .or_else(|| env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = ConfigLoader::load(&config_path).context("Failed to load configuration")?;

    info!("Configuration loaded from: {}", config_path);
    info!("Currency: {}", config.marketplace.currency);
    info!(
        "Refund schedule: {} tiers, commission {}%, owner-cancel penalty {}%",
        config.policy.refund_tiers.len(),
        config.policy.platform_commission_percent,
        config.policy.owner_cancel_penalty_percent
    );

    // Surface configuration warnings before anything starts
    let report = config::ConfigValidator::validate(&config)?;
    for warning in &report.warnings {
        warn!("Config warning: {}: {}", warning.field, warning.message);
    }

    // Create and start the application
    let mut app = Application::new(config)
        .await
        .context("Failed to create application")?;

    // Setup signal handling
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    };

    // Run the application
    info!("Application starting...");
    tokio::select! {
        result = app.run() => {
            if let Err(e) = result {
                tracing::error!("Application error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_signal => {
            info!("Initiating graceful shutdown...");
            app.shutdown().await?;
        }
    }

    info!("Wheelbase shutdown complete");
    Ok(())
}

/// Initialize logging based on environment variables
fn init_logging() -> Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        "json" | _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!("Logging initialized");
    info!("Log level: {}", log_level);
    info!("Log format: {}", log_format);

    if log_level == "trace" || log_level == "debug" {
        warn!("Debug/trace logging enabled - may impact performance in production");
    }

    Ok(())
}
