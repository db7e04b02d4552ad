use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holdarr_config::Config;
use holdarr_core::{
    AdapterSet, EntryResolver, LifecycleOrchestrator, MonitorSettings,
    PlaceholderProjection, PlexNotifier,
};
use holdarr_server::{AppState, routes};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "holdarr-server")]
#[command(
    about = "Keeps a media catalog populated with stand-in files and swaps in real media on demand"
)]
struct Cli {
    /// Bind host override (defaults to APP_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port override (defaults to APP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Load environment from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| {
                format!("failed to load env file {}", path.display())
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holdarr=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    // Configuration faults are fatal here, before anything touches the
    // libraries.
    config.validate().context("configuration rejected")?;

    let adapters = AdapterSet::from_config(&config)
        .context("failed to build acquisition clients")?;
    let projection = PlaceholderProjection::new(&config.placeholder);
    let notifier = Arc::new(
        PlexNotifier::new(&config.catalog, config.monitor.request_timeout)
            .context("failed to build catalog notifier")?,
    );
    let resolver = Arc::new(EntryResolver::new(
        config.libraries.clone(),
        config.tv.clone(),
    ));
    let orchestrator = LifecycleOrchestrator::new(
        adapters,
        projection,
        notifier,
        config.libraries.clone(),
        MonitorSettings::from(&config.monitor),
    );

    let app = routes::create_router(AppState {
        orchestrator,
        resolver,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        strategy = config.placeholder.strategy.as_str(),
        tv_scope = %config.tv.scope,
        "holdarr listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, cancelling outstanding monitors");
}
