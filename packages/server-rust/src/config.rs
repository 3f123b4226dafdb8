//! Server-level configuration.

use std::path::PathBuf;

use crate::network::{NetworkConfig, QueueConfig};

/// Top-level configuration for a `RuleGrid` server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Unique identifier of this server instance; keys the persisted state.
    pub server_id: String,
    /// Directory for persisted server state. `None` keeps state in memory.
    pub state_dir: Option<PathBuf>,
    /// Query backend token used to resolve the task query strategy.
    pub query_backend: String,
    /// Timeout for a single container execution call in milliseconds.
    pub call_timeout_ms: u64,
    /// HTTP transport configuration.
    pub network: NetworkConfig,
    /// Queue transport configuration.
    pub queue: QueueConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_id: "rulegrid-server".to_string(),
            state_dir: None,
            query_backend: "postgres".to_string(),
            call_timeout_ms: 30_000,
            network: NetworkConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}
