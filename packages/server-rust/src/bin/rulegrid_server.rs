//! `RuleGrid` server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rulegrid_server::config::ServerConfig;
use rulegrid_server::marshal::MarshallerRegistry;
use rulegrid_server::network::{NetworkConfig, NetworkModule};
use rulegrid_server::query::{InMemoryQueryBackend, QueryStrategies, TaskQueryService};
use rulegrid_server::service::{NullEngine, RequestRouter, ServerAdmin};
use rulegrid_server::state::{FileStateRepository, InMemoryStateRepository, StateRepository};
use rulegrid_server::ContainerEngine;

#[derive(Debug, Parser)]
#[command(name = "rulegrid-server", about = "Multi-container rule/process execution server")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "RULEGRID_HOST")]
    host: String,

    /// Listen port. 0 picks an OS-assigned port.
    #[arg(long, default_value_t = 8085, env = "RULEGRID_PORT")]
    port: u16,

    /// Server identity; keys the persisted state snapshot.
    #[arg(long, default_value = "rulegrid-server", env = "RULEGRID_SERVER_ID")]
    server_id: String,

    /// Directory for persisted server state. Omit to keep state in memory.
    #[arg(long, env = "RULEGRID_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Query backend token for the task query strategy.
    #[arg(long, default_value = "postgres", env = "RULEGRID_QUERY_BACKEND")]
    query_backend: String,

    /// Per-request container execution timeout in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "RULEGRID_CALL_TIMEOUT_MS")]
    call_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            server_id: self.server_id,
            state_dir: self.state_dir,
            query_backend: self.query_backend,
            call_timeout_ms: self.call_timeout_ms,
            network: NetworkConfig {
                host: self.host,
                port: self.port,
                ..NetworkConfig::default()
            },
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();

    let repository: Arc<dyn StateRepository> = match &config.state_dir {
        Some(dir) => Arc::new(FileStateRepository::new(dir)?),
        None => Arc::new(InMemoryStateRepository::new()),
    };

    let admin = Arc::new(ServerAdmin::new(
        config.server_id.as_str(),
        Arc::clone(&repository),
    ));
    let state = admin.bootstrap()?;
    info!(
        server_id = %config.server_id,
        containers = state.containers.len(),
        "server state loaded"
    );

    let registry = Arc::new(MarshallerRegistry::with_defaults());
    let engine: Arc<dyn ContainerEngine> = Arc::new(NullEngine);
    let router = Arc::new(RequestRouter::new(
        config.server_id.as_str(),
        Arc::clone(&registry),
        repository,
        engine,
        Duration::from_millis(config.call_timeout_ms),
    ));
    let tasks = Arc::new(TaskQueryService::new(
        QueryStrategies::standard(),
        Arc::new(InMemoryQueryBackend::new()),
        config.query_backend.as_str(),
    ));

    let mut network = NetworkModule::new(config.network.clone(), router, admin, tasks);
    let port = network.start().await?;
    info!(port, "rulegrid server listening");

    let lifecycle = network.lifecycle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            lifecycle.begin_drain();
        }
    });

    let result = network.serve().await;
    registry.dispose();
    result
}
