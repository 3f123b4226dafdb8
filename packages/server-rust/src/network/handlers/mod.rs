//! HTTP handler definitions for the `RuleGrid` server.
//!
//! Defines `AppState` (the shared state carried through axum extractors)
//! and re-exports all handler functions for convenient access when
//! building the router.

pub mod admin;
pub mod execute;
pub mod health;
pub mod queries;

pub use admin::{
    create_container_handler, dispose_container_handler, list_containers_handler,
    server_info_handler, start_container_handler, stop_container_handler,
};
pub use execute::execute_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use queries::task_query_handler;

use std::sync::Arc;
use std::time::Instant;

use crate::network::shutdown::Lifecycle;
use crate::query::TaskQueryService;
use crate::service::{RequestRouter, ServerAdmin};

/// Header carrying the verified user id, set by the upstream
/// authentication collaborator. Handlers only read it.
pub const USER_HEADER: &str = "X-RuleGrid-User";
/// Header carrying the verified roles as a comma-separated list.
pub const ROLES_HEADER: &str = "X-RuleGrid-Roles";

/// Shared application state passed to all axum handlers via `State`
/// extraction. Holds `Arc` references so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Envelope dispatch for container execution requests.
    pub router: Arc<RequestRouter>,
    /// Administrative path for container lifecycle mutations.
    pub admin: Arc<ServerAdmin>,
    /// Read-side task query service.
    pub tasks: Arc<TaskQueryService>,
    /// Lifecycle phase and drain signal.
    pub lifecycle: Arc<Lifecycle>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
