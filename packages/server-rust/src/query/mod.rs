//! Read-side querying: backend-specific query strategies and the task
//! listing service.

pub mod memory;
pub mod strategy;
pub mod tasks;

pub use memory::InMemoryQueryBackend;
pub use strategy::{QueryBackendKind, QueryDescriptor, QueryError, QueryStrategies};
pub use tasks::{TaskQueryFilter, TaskQueryService};
