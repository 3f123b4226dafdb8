//! `RuleGrid` Server — multi-container execution server with pluggable
//! marshalling, HTTP and queue transports, and durable per-server state.

pub mod config;
pub mod marshal;
pub mod network;
pub mod query;
pub mod service;
pub mod state;
pub mod traits;

pub use config::ServerConfig;
pub use traits::{ContainerEngine, QueryBackend, Row};
