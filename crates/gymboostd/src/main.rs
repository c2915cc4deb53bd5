use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gymboost_server::{secrets::Secrets, ServerConfig};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "gymboostd",
    about = "gymboostd — GymBoost Console server daemon",
    version
)]
struct Cli {
    /// Log level: error, warn, info, debug, verbose (default: $GYMBOOST_LOG_LEVEL or warn)
    #[arg(long, global = true, env = "GYMBOOST_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console HTTP server
    Serve {
        /// Port to listen on (default: $GYMBOOST_PORT or 3000)
        #[arg(long, env = "GYMBOOST_PORT", default_value = "3000")]
        port: u16,
        /// Host to bind (default: $GYMBOOST_HOST or 0.0.0.0)
        #[arg(long, env = "GYMBOOST_HOST", default_value = "0.0.0.0")]
        host: String,
    },
    /// Probe the AI and email providers once and print their status as JSON
    Check,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let raw = cli.log_level.unwrap_or_else(|| "warn".into());
    let effective_log_level = if raw.eq_ignore_ascii_case("verbose") {
        "debug".to_owned()
    } else {
        raw
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&effective_log_level))
        .init();

    match cli.command {
        Commands::Serve { port, host } => cmd_serve(host, port).await,
        Commands::Check => cmd_check().await,
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(host: String, port: u16) -> Result<()> {
    let cfg = ServerConfig {
        host,
        port,
        ..Default::default()
    };

    gymboost_server::run(cfg).await
}

async fn cmd_check() -> Result<()> {
    tracing::info!("probing providers");
    let report = gymboost_server::check_providers(&ServerConfig::default(), Secrets::from_env())
        .await?;
    let out = serde_json::to_string_pretty(&report).context("render report")?;
    println!("{out}");
    Ok(())
}
