//! Transport configuration.

use std::time::Duration;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Queue transport configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Bounded capacity of the inbound request channel.
    pub request_capacity: usize,
    /// Bounded capacity of the outbound response channel.
    pub response_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            request_capacity: 256,
            response_capacity: 256,
        }
    }
}
