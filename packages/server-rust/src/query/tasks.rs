//! Task listing: pagination, caller identity, and strategy resolution in
//! front of the query backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use rulegrid_core::{
    authenticated_user, caller_roles, PageRequest, RequestContext, TaskSummary, Value,
};
use tracing::debug;

use crate::query::{QueryError, QueryStrategies};
use crate::traits::{QueryBackend, Row};

/// Role whose members may list tasks owned by anyone.
pub const PROCESS_ADMIN_ROLE: &str = "process-admin";

/// Caller-supplied task filter.
#[derive(Debug, Clone, Default)]
pub struct TaskQueryFilter {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub created_after_ms: Option<i64>,
    /// Additional filter parameters keyed by logical column name. A key
    /// with no mapping entry in the resolved descriptor is a caller error.
    pub params: BTreeMap<String, Value>,
}

/// Read-side task query service.
pub struct TaskQueryService {
    strategies: QueryStrategies,
    backend: Arc<dyn QueryBackend>,
    backend_token: String,
}

impl TaskQueryService {
    #[must_use]
    pub fn new(
        strategies: QueryStrategies,
        backend: Arc<dyn QueryBackend>,
        backend_token: impl Into<String>,
    ) -> Self {
        Self {
            strategies,
            backend,
            backend_token: backend_token.into(),
        }
    }

    /// Lists tasks visible to the caller.
    ///
    /// Pagination inputs are normalized first (absent/negative clamp to 0;
    /// page size 0 means no limit). Authenticated callers without the
    /// `process-admin` role only see their own tasks; admins and anonymous
    /// internal callers may filter by any owner.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnsupportedBackend`] for an unknown backend token,
    /// [`QueryError::MissingColumnMapping`] for a filter parameter with no
    /// mapping entry, [`QueryError::Backend`] when the backend fails.
    pub async fn tasks_for_caller(
        &self,
        ctx: &RequestContext,
        page: Option<i64>,
        page_size: Option<i64>,
        filter: &TaskQueryFilter,
    ) -> Result<Vec<TaskSummary>, QueryError> {
        let page = PageRequest::normalize(page, page_size);
        let descriptor = self.strategies.resolve(&self.backend_token)?;

        let mut params: BTreeMap<String, Value> = BTreeMap::new();
        if let Some(status) = &filter.status {
            params.insert("status".to_string(), Value::from(status.clone()));
        }
        let owner = if caller_roles(ctx).contains(PROCESS_ADMIN_ROLE) {
            filter.owner.clone()
        } else {
            authenticated_user(ctx)
                .map(str::to_string)
                .or_else(|| filter.owner.clone())
        };
        if let Some(owner) = owner {
            params.insert("owner".to_string(), Value::from(owner));
        }
        if let Some(after) = filter.created_after_ms {
            params.insert("createdAfter".to_string(), Value::Int(after));
        }
        for (key, value) in &filter.params {
            params.insert(key.clone(), value.clone());
        }

        // Every supplied parameter must be covered by the mapping before
        // the backend sees the query.
        descriptor.column_mapping_for(params.keys().map(String::as_str))?;

        debug!(
            backend = descriptor.backend.token(),
            page = page.page,
            page_size = page.page_size,
            params = params.len(),
            "running task query"
        );

        let rows = self
            .backend
            .fetch(descriptor, &params, page)
            .await
            .map_err(QueryError::Backend)?;
        Ok(rows.iter().map(task_from_row).collect())
    }
}

fn task_from_row(row: &Row) -> TaskSummary {
    let str_column = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    TaskSummary {
        task_id: row.get("taskId").and_then(Value::as_i64).unwrap_or_default(),
        name: str_column("name"),
        status: str_column("status"),
        actual_owner: row
            .get("owner")
            .and_then(Value::as_str)
            .map(str::to_string),
        container_id: str_column("containerId"),
        created_at_ms: row
            .get("createdAfter")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use rulegrid_core::Principal;

    use crate::query::InMemoryQueryBackend;

    use super::*;

    fn task(id: i64, owner: &str, status: &str, created: i64) -> TaskSummary {
        TaskSummary {
            task_id: id,
            name: format!("task-{id}"),
            status: status.to_string(),
            actual_owner: Some(owner.to_string()),
            container_id: "c1".to_string(),
            created_at_ms: created,
        }
    }

    fn service() -> TaskQueryService {
        let backend = InMemoryQueryBackend::new();
        backend.insert_task(&task(1, "alice", "Reserved", 100));
        backend.insert_task(&task(2, "bob", "Reserved", 200));
        backend.insert_task(&task(3, "alice", "Reserved", 300));
        TaskQueryService::new(QueryStrategies::standard(), Arc::new(backend), "postgres")
    }

    fn user_ctx(user: &str, roles: &[&str]) -> RequestContext {
        RequestContext::authenticated("srv-1", Principal::new(user, roles.iter().copied()))
    }

    #[tokio::test]
    async fn non_admin_sees_only_their_own_tasks() {
        let service = service();
        let tasks = service
            .tasks_for_caller(
                &user_ctx("alice", &[]),
                None,
                None,
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks
            .iter()
            .all(|t| t.actual_owner.as_deref() == Some("alice")));
    }

    #[tokio::test]
    async fn admin_may_filter_by_any_owner() {
        let service = service();
        let filter = TaskQueryFilter {
            owner: Some("bob".to_string()),
            ..TaskQueryFilter::default()
        };
        let tasks = service
            .tasks_for_caller(
                &user_ctx("alice", &[PROCESS_ADMIN_ROLE]),
                None,
                None,
                &filter,
            )
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].actual_owner.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn admin_without_owner_filter_sees_everything() {
        let service = service();
        let tasks = service
            .tasks_for_caller(
                &user_ctx("alice", &[PROCESS_ADMIN_ROLE]),
                None,
                None,
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap();
        assert_eq!(tasks.len(), 3);
    }

    #[tokio::test]
    async fn zero_page_size_reaches_the_backend_as_no_limit() {
        let service = service();
        let tasks = service
            .tasks_for_caller(
                &user_ctx("admin", &[PROCESS_ADMIN_ROLE]),
                Some(0),
                Some(0),
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap();
        // 0 means unbounded, not zero rows.
        assert_eq!(tasks.len(), 3);
    }

    #[tokio::test]
    async fn pagination_is_normalized_before_the_backend_runs() {
        let service = service();
        let tasks = service
            .tasks_for_caller(
                &user_ctx("admin", &[PROCESS_ADMIN_ROLE]),
                Some(-3),
                Some(2),
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap();
        // Negative page clamps to page 0.
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id, 3);
    }

    #[tokio::test]
    async fn unmapped_filter_param_is_a_caller_error() {
        let service = service();
        let filter = TaskQueryFilter {
            params: [("priority".to_string(), Value::Int(5))].into_iter().collect(),
            ..TaskQueryFilter::default()
        };
        let err = service
            .tasks_for_caller(&user_ctx("alice", &[]), None, None, &filter)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingColumnMapping { ref column } if column == "priority"
        ));
    }

    #[tokio::test]
    async fn unsupported_backend_token_is_an_error() {
        let backend = InMemoryQueryBackend::new();
        let service =
            TaskQueryService::new(QueryStrategies::standard(), Arc::new(backend), "db2");
        let err = service
            .tasks_for_caller(
                &user_ctx("alice", &[]),
                None,
                None,
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedBackend { .. }));
    }

    #[tokio::test]
    async fn rows_convert_to_task_summaries() {
        let service = service();
        let tasks = service
            .tasks_for_caller(
                &user_ctx("bob", &[]),
                None,
                None,
                &TaskQueryFilter::default(),
            )
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.task_id, 2);
        assert_eq!(task.name, "task-2");
        assert_eq!(task.status, "Reserved");
        assert_eq!(task.container_id, "c1");
        assert_eq!(task.created_at_ms, 200);
    }
}
