//! Vision I/O service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use io_vision::caps::{report_capabilities, Capabilities};
use io_vision::config::Config;
use io_vision::server;
use io_vision::utils::shutdown_signal;
use io_vision::SERVICE_NAME;

/// Vision I/O service shell.
#[derive(Parser, Debug)]
#[command(name = "io-vision")]
#[command(about = "Health, metrics, capability report and stub vision endpoints")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    /// HTTP server port (overrides UNISON_PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,

    /// Send the capability report once and exit.
    ReportCaps,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration problems are reported after logging is up.
    let config = Config::load();
    let json_logs = args.json || config.as_ref().map(|c| c.log_json).unwrap_or(false);

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("io_vision=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let fmt_layer = if json_logs {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    let mut config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::ReportCaps) => cmd_report_caps(&config).await,
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("{} - CONFIGURATION CHECK", SERVICE_NAME.to_uppercase());
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen Port: {}", config.port);
    println!("  Orchestrator: {}", config.orchestrator_event_url());
    println!("  Default Person: {}", config.default_person_id);
    println!("  Capabilities: {}", Capabilities::from_config(config));
    println!("  Log Format: {}", if config.log_json { "JSON" } else { "Text" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Send the capability report in the foreground.
async fn cmd_report_caps(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let outcome = report_capabilities(config).await;
    println!(
        "Capability report to {}: {} (status {})",
        config.orchestrator_event_url(),
        if outcome.ok { "accepted" } else { "FAILED" },
        outcome.status
    );

    if outcome.ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Capability report was not accepted"))
    }
}

/// Run the HTTP service.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    // Orchestrator settings only feed the startup report; serve regardless.
    if let Err(e) = config.validate() {
        warn!(service = SERVICE_NAME, error = %e, "Capability report will not be delivered");
    }

    info!(service = SERVICE_NAME, "Configuration loaded successfully");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    server::serve(config, listener, shutdown_signal()).await?;

    Ok(())
}
