//! In-memory [`QueryBackend`] for tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rulegrid_core::{PageRequest, TaskSummary, Value};

use crate::query::QueryDescriptor;
use crate::traits::{QueryBackend, Row};

/// Reference backend holding task rows in process memory.
///
/// Filtering semantics: the `createdAfter` parameter is a lower bound on
/// the row's `createdAfter` column; every other parameter must match its
/// row value exactly. Rows come back newest-first, like the SQL templates'
/// `order by ... desc`.
#[derive(Debug, Default)]
pub struct InMemoryQueryBackend {
    rows: RwLock<Vec<Row>>,
}

impl InMemoryQueryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Adds one task row.
    pub fn insert_task(&self, task: &TaskSummary) {
        let mut row = Row::new();
        row.insert("taskId".to_string(), Value::Int(task.task_id));
        row.insert("name".to_string(), Value::from(task.name.clone()));
        row.insert("status".to_string(), Value::from(task.status.clone()));
        if let Some(owner) = &task.actual_owner {
            row.insert("owner".to_string(), Value::from(owner.clone()));
        }
        row.insert(
            "containerId".to_string(),
            Value::from(task.container_id.clone()),
        );
        row.insert("createdAfter".to_string(), Value::Int(task.created_at_ms));
        self.rows.write().push(row);
    }

    fn matches(row: &Row, params: &BTreeMap<String, Value>) -> bool {
        params.iter().all(|(key, expected)| {
            if key == "createdAfter" {
                match (row.get(key).and_then(Value::as_i64), expected.as_i64()) {
                    (Some(actual), Some(bound)) => actual >= bound,
                    _ => false,
                }
            } else {
                row.get(key) == Some(expected)
            }
        })
    }
}

#[async_trait]
impl QueryBackend for InMemoryQueryBackend {
    async fn fetch(
        &self,
        _descriptor: &QueryDescriptor,
        params: &BTreeMap<String, Value>,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Row>> {
        let mut rows: Vec<Row> = self
            .rows
            .read()
            .iter()
            .filter(|row| Self::matches(row, params))
            .cloned()
            .collect();
        rows.sort_by_key(|row| {
            std::cmp::Reverse(row.get("createdAfter").and_then(Value::as_i64).unwrap_or(0))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let rows = rows.into_iter().skip(offset);
        // Page size 0 means no limit.
        let rows: Vec<Row> = match page.limit() {
            Some(limit) => rows.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
            None => rows.collect(),
        };
        Ok(rows)
    }
}
