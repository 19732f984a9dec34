//! CLI entry point for the sync subcommand.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nodelink_config::{CliOverrides, apply_overrides, load_config, validate_config};
use nodelink_core::defaults::DEFAULT_LOG_LEVEL;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::PanelClient;
use crate::collector::UsageCollector;
use crate::daemon::{SyncIntervals, run_sync_loop};
use crate::status::SystemProbe;

/// CLI arguments for the sync subcommand.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodelink-sync",
    version,
    about = "Keep a proxy node in sync with its management panel"
)]
pub struct SyncArgs {
    /// Config file path (TOML, YAML or JSON).
    #[arg(short, long, default_value = "nodelink.toml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Run the sync agent until SIGINT/SIGTERM.
pub async fn run(args: SyncArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)
        .map_err(|e| format!("failed to load config {:?}: {e}", args.config))?;
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;

    init_tracing(config.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL));

    info!(
        version = nodelink_core::VERSION,
        api_host = %config.panel.api_host,
        node_id = config.panel.node_id,
        node_type = %config.panel.node_type,
        "nodelink starting"
    );

    let client = Arc::new(PanelClient::from_config(&config.panel)?);
    info!(local_rules = client.local_rules().len(), "panel client ready");

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    let (snapshots, _engine) = watch::channel(None);
    run_sync_loop(
        client,
        UsageCollector::new(),
        SystemProbe::new(),
        SyncIntervals::from(&config.sync),
        snapshots,
        shutdown,
    )
    .await;

    info!("nodelink stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
