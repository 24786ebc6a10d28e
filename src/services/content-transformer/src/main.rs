//! Content Transformer Service - Main Entry Point

use anyhow::Context;
use clap::Parser;
use content_transformer::{build_router, AppState, Config};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "content-transformer",
    about = "MindLoom content transformation service",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Bind address (overrides CONTENT_TRANSFORMER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Service port (overrides CONTENT_TRANSFORMER_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides LOG_LEVEL)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate_config: bool,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("content_transformer={},tower_http=debug", config.log_level).into()
    });

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    config.validate().context("Configuration validation failed")?;
    if args.validate_config {
        println!("✅ Configuration is valid");
        return Ok(());
    }

    init_tracing(&config);
    info!(
        "Starting Content Transformer Service v{} in {} mode",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let addr = config.server.address();
    let state = AppState::new(config).context("Failed to initialize application state")?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Content Transformer Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Content Transformer Service shut down gracefully");
    Ok(())
}
