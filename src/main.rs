use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uphone_server::{
    metrics,
    server::{self, ServeHealth, ServeState},
    Marketplace, ServerConfig,
};

/// uPhone marketplace server
#[derive(Parser)]
#[command(name = "uphone", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct ServeArgs {
    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.json_logs)?;
    info!("Starting uPhone server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid environment override")?;

    let result = match cli.command {
        Commands::Serve(args) => cmd_serve(args, config).await,
        Commands::Config => cmd_config(&config),
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}

fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level: tracing::Level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

async fn cmd_serve(args: ServeArgs, mut config: ServerConfig) -> Result<()> {
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    config.validate().context("Refusing to start")?;

    if config.auth.issue_tokens {
        warn!("token issuance is enabled: /get-access-token signs tokens for any uid");
    }
    metrics::register_metrics();
    let market = Arc::new(Marketplace::from_config(&config));
    let health = Arc::new(ServeHealth::new());
    let state = ServeState::with_health(market, health.clone());
    let app = server::build_router(state, &config.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.bind, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    server::serve(listener, app, health)
        .await
        .context("Server exited with error")?;
    info!("Server stopped");
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", serde_yaml::to_string(&config.redacted())?);
    Ok(())
}
