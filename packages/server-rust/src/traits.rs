use std::collections::BTreeMap;

use async_trait::async_trait;
use rulegrid_core::{ExecutionRequest, ExecutionResults, PageRequest, Value};

use crate::query::QueryDescriptor;

/// One result row from a query backend, keyed by logical column name.
pub type Row = BTreeMap<String, Value>;

/// The execution engine hosted inside each container.
///
/// Opaque collaborator: the server routes decoded requests here and adapts
/// the results for the wire. Implementations must be safe to call from any
/// number of request workers concurrently.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Executes a command batch against the given container.
    async fn execute(
        &self,
        container_id: &str,
        request: ExecutionRequest,
    ) -> anyhow::Result<ExecutionResults>;
}

/// Pluggable store behind the read-side task queries.
/// Implementations: relational databases keyed by the descriptor's dialect,
/// memory (tests and local development).
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Runs the descriptor's query with the given parameters.
    ///
    /// `params` are keyed by logical column name and have already been
    /// validated against the descriptor's column mapping. A `page` whose
    /// `limit()` is `None` (page size 0) must be executed without a row
    /// limit -- callers rely on 0 meaning "unbounded".
    async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        params: &BTreeMap<String, Value>,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Row>>;
}
