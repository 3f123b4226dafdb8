//! Transports: HTTP (axum) and the in-process message queue, plus network
//! configuration and the server lifecycle controller.

pub mod config;
pub mod handlers;
pub mod module;
pub mod queue;
pub mod shutdown;

pub use config::{NetworkConfig, QueueConfig};
pub use handlers::AppState;
pub use module::NetworkModule;
pub use queue::{QueueEndpoint, QueueMessage};
pub use shutdown::{Lifecycle, LifecyclePhase};
