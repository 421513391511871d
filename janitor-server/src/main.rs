//! # Media Janitor
//!
//! Keeps a Radarr/Sonarr managed library healthy: every file is probed and
//! sample-decoded, and broken or mislabelled files are deleted, blocklisted
//! and searched for again within a daily budget.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use janitor_server::create_app;
use janitor_server::infra::config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use janitor_server::infra::scheduler::Scheduler;
use janitor_server::infra::startup::build_app_state;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "janitor-server")]
#[command(about = "Proactive media library quality monitor for Radarr and Sonarr")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the configuration, print it and exit
    CheckConfig,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Configuration file (overrides JANITOR_CONFIG and default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment file loaded before reading variables
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, warnings) = load_runtime_config(&cli.serve)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    match &config.metadata.config_path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("running without a configuration file"),
    }
    log_warnings(&warnings);

    if let Some(Command::CheckConfig) = cli.command {
        let rendered = serde_json::to_string_pretty(&config)
            .context("failed to render configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    serve(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<(Config, ConfigWarnings)> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }
    Ok((config, warnings))
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config
        .server
        .bind_addr()
        .with_context(|| format!("invalid bind address {}:{}", config.server.host, config.server.port))?;

    let state = build_app_state(config).await.context("failed to start janitor")?;
    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::start(state.clone(), shutdown.clone());

    let app = create_app(state.clone());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "media janitor listening");

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await;
    if let Err(err) = &served {
        error!(error = %err, "server error");
    }

    scheduler.stop().await;
    state.pool.shutdown().await;
    state.janitor.state().flush();
    info!("media janitor stopped");

    served.context("server terminated abnormally")
}
