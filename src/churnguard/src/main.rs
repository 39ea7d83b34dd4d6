//! ChurnGuard — real-time churn intervention decision service.
//!
//! Main entry point that initializes the decision engine and starts the
//! HTTP API and metrics exporter.

use churn_api::ApiServer;
use churn_core::config::AppConfig;
use churn_engine::{EngineSnapshot, InterventionEngine};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "churnguard")]
#[command(about = "Real-time churn intervention decision service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CHURNGUARD__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CHURNGUARD__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Starting intervention budget (overrides config)
    #[arg(long, env = "CHURNGUARD__ENGINE__INITIAL_BUDGET")]
    initial_budget: Option<f64>,

    /// Engine snapshot to restore at startup
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churnguard=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("ChurnGuard starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(budget) = cli.initial_budget {
        config.engine.initial_budget = budget;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        epsilon = config.engine.epsilon,
        standard_share = config.engine.standard_share,
        initial_budget = config.engine.initial_budget,
        "Configuration loaded"
    );

    // Initialize the decision engine
    let engine = Arc::new(InterventionEngine::new(config.engine.clone()));

    // Restore prior state when a snapshot was supplied
    if let Some(path) = cli.snapshot {
        let restored =
            EngineSnapshot::load_from_file(&path).and_then(|snapshot| engine.restore(snapshot));
        match restored {
            Ok(()) => info!(path = %path.display(), "Engine snapshot restored"),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to restore snapshot, starting fresh")
            }
        }
    }

    // Start API server
    let api_server = ApiServer::new(config.clone(), engine);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("ChurnGuard is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
