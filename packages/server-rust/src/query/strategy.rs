//! Backend-specific query descriptors.
//!
//! One descriptor per supported database dialect, held as plain data in a
//! lookup table: the parameterized query expression plus the mapping from
//! logical column names to the dialect's physical columns. The mapping must
//! cover every `:placeholder` the expression references.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

/// Errors from resolving or applying a query strategy.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No descriptor is registered for the backend token.
    #[error("unsupported query backend '{token}'")]
    UnsupportedBackend { token: String },
    /// A caller-supplied parameter has no column mapping entry. Caller
    /// error, distinct from an unsupported backend.
    #[error("no column mapping for parameter '{column}'")]
    MissingColumnMapping { column: String },
    /// The backend collaborator failed to execute the query.
    #[error("query backend failed: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Supported database dialects for the read-side queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryBackendKind {
    Postgres,
    Mysql,
    Oracle,
    Sqlserver,
}

impl QueryBackendKind {
    /// Parses a backend token (case-insensitive, common aliases accepted).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::Mysql),
            "oracle" => Some(Self::Oracle),
            "sqlserver" | "mssql" => Some(Self::Sqlserver),
            _ => None,
        }
    }

    /// The canonical token for this backend.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Oracle => "oracle",
            Self::Sqlserver => "sqlserver",
        }
    }
}

/// A backend's query template plus its logical-to-physical column mapping.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub backend: QueryBackendKind,
    /// Parameterized query text with `:name` placeholders.
    pub expression: String,
    /// Logical column name to physical column name.
    pub column_mapping: BTreeMap<String, String>,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

impl QueryDescriptor {
    /// The logical column names referenced as placeholders by the
    /// expression.
    #[must_use]
    pub fn referenced_columns(&self) -> BTreeSet<String> {
        placeholder_regex()
            .captures_iter(&self.expression)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// The physical column mapped to a logical name.
    #[must_use]
    pub fn physical_column(&self, logical: &str) -> Option<&str> {
        self.column_mapping.get(logical).map(String::as_str)
    }

    /// Builds the logical-to-physical mapping restricted to the supplied
    /// parameter names.
    ///
    /// # Errors
    ///
    /// [`QueryError::MissingColumnMapping`] for the first parameter with no
    /// mapping entry.
    pub fn column_mapping_for<'a>(
        &self,
        params: impl IntoIterator<Item = &'a str>,
    ) -> Result<BTreeMap<String, String>, QueryError> {
        let mut mapping = BTreeMap::new();
        for param in params {
            let Some(physical) = self.physical_column(param) else {
                return Err(QueryError::MissingColumnMapping {
                    column: param.to_string(),
                });
            };
            mapping.insert(param.to_string(), physical.to_string());
        }
        Ok(mapping)
    }
}

/// Lookup table of query descriptors keyed by backend.
#[derive(Debug, Clone)]
pub struct QueryStrategies {
    descriptors: HashMap<QueryBackendKind, QueryDescriptor>,
}

impl QueryStrategies {
    /// The standard task-listing query for every supported dialect.
    #[must_use]
    pub fn standard() -> Self {
        let mut descriptors = HashMap::new();
        for backend in [
            QueryBackendKind::Postgres,
            QueryBackendKind::Mysql,
            QueryBackendKind::Oracle,
            QueryBackendKind::Sqlserver,
        ] {
            descriptors.insert(backend, task_query_descriptor(backend));
        }
        Self { descriptors }
    }

    /// Resolves the descriptor for a backend token.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnsupportedBackend`] for unknown tokens and for known
    /// dialects with no registered descriptor.
    pub fn resolve(&self, token: &str) -> Result<&QueryDescriptor, QueryError> {
        let unsupported = || QueryError::UnsupportedBackend {
            token: token.to_string(),
        };
        let kind = QueryBackendKind::from_token(token).ok_or_else(unsupported)?;
        self.descriptors.get(&kind).ok_or_else(unsupported)
    }

    /// The registered backends.
    #[must_use]
    pub fn backends(&self) -> Vec<QueryBackendKind> {
        self.descriptors.keys().copied().collect()
    }
}

impl Default for QueryStrategies {
    fn default() -> Self {
        Self::standard()
    }
}

fn task_query_descriptor(backend: QueryBackendKind) -> QueryDescriptor {
    let (expression, columns): (String, [(&str, &str); 6]) = match backend {
        QueryBackendKind::Postgres => (
            "select t.id, t.name, t.status, t.actual_owner, t.container_id, t.created_at \
             from user_tasks t \
             where t.status = :status \
             and (:owner is null or t.actual_owner = :owner) \
             and t.created_at >= :createdAfter \
             order by t.created_at desc"
                .to_string(),
            [
                ("taskId", "t.id"),
                ("name", "t.name"),
                ("status", "t.status"),
                ("owner", "t.actual_owner"),
                ("containerId", "t.container_id"),
                ("createdAfter", "t.created_at"),
            ],
        ),
        QueryBackendKind::Mysql => (
            "select t.`id`, t.`name`, t.`status`, t.`actual_owner`, t.`container_id`, \
             t.`created_at` from `user_tasks` t \
             where t.`status` = :status \
             and (:owner is null or t.`actual_owner` = :owner) \
             and t.`created_at` >= :createdAfter \
             order by t.`created_at` desc"
                .to_string(),
            [
                ("taskId", "t.`id`"),
                ("name", "t.`name`"),
                ("status", "t.`status`"),
                ("owner", "t.`actual_owner`"),
                ("containerId", "t.`container_id`"),
                ("createdAfter", "t.`created_at`"),
            ],
        ),
        QueryBackendKind::Oracle => (
            "select t.ID, t.NAME, t.STATUS, t.ACTUAL_OWNER, t.CONTAINER_ID, t.CREATED_AT \
             from USER_TASKS t \
             where t.STATUS = :status \
             and (:owner is null or t.ACTUAL_OWNER = :owner) \
             and t.CREATED_AT >= :createdAfter \
             order by t.CREATED_AT desc"
                .to_string(),
            [
                ("taskId", "t.ID"),
                ("name", "t.NAME"),
                ("status", "t.STATUS"),
                ("owner", "t.ACTUAL_OWNER"),
                ("containerId", "t.CONTAINER_ID"),
                ("createdAfter", "t.CREATED_AT"),
            ],
        ),
        QueryBackendKind::Sqlserver => (
            "select t.[id], t.[name], t.[status], t.[actual_owner], t.[container_id], \
             t.[created_at] from [user_tasks] t \
             where t.[status] = :status \
             and (:owner is null or t.[actual_owner] = :owner) \
             and t.[created_at] >= :createdAfter \
             order by t.[created_at] desc"
                .to_string(),
            [
                ("taskId", "t.[id]"),
                ("name", "t.[name]"),
                ("status", "t.[status]"),
                ("owner", "t.[actual_owner]"),
                ("containerId", "t.[container_id]"),
                ("createdAfter", "t.[created_at]"),
            ],
        ),
    };

    QueryDescriptor {
        backend,
        expression,
        column_mapping: columns
            .into_iter()
            .map(|(logical, physical)| (logical.to_string(), physical.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_backends() {
        let strategies = QueryStrategies::standard();
        for token in ["postgres", "mysql", "oracle", "sqlserver"] {
            let descriptor = strategies.resolve(token).expect("resolve");
            assert_eq!(descriptor.backend.token(), token);
        }
    }

    #[test]
    fn resolve_accepts_aliases() {
        let strategies = QueryStrategies::standard();
        assert_eq!(
            strategies.resolve("PostgreSQL").unwrap().backend,
            QueryBackendKind::Postgres
        );
        assert_eq!(
            strategies.resolve("mssql").unwrap().backend,
            QueryBackendKind::Sqlserver
        );
    }

    #[test]
    fn unsupported_backend_is_an_error() {
        let strategies = QueryStrategies::standard();
        let err = strategies.resolve("db2").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedBackend { ref token } if token == "db2"
        ));
    }

    #[test]
    fn every_registered_backend_maps_all_referenced_columns() {
        let strategies = QueryStrategies::standard();
        for backend in strategies.backends() {
            let descriptor = strategies.resolve(backend.token()).unwrap();
            for column in descriptor.referenced_columns() {
                assert!(
                    descriptor.physical_column(&column).is_some(),
                    "{} expression references '{column}' with no mapping entry",
                    backend.token()
                );
            }
        }
    }

    #[test]
    fn referenced_columns_extracts_placeholders() {
        let strategies = QueryStrategies::standard();
        let descriptor = strategies.resolve("postgres").unwrap();
        let referenced = descriptor.referenced_columns();
        assert!(referenced.contains("status"));
        assert!(referenced.contains("owner"));
        assert!(referenced.contains("createdAfter"));
        assert_eq!(referenced.len(), 3);
    }

    #[test]
    fn column_mapping_for_known_params() {
        let strategies = QueryStrategies::standard();
        let descriptor = strategies.resolve("oracle").unwrap();

        let mapping = descriptor
            .column_mapping_for(["status", "owner"])
            .expect("mapping");
        assert_eq!(mapping.get("status").map(String::as_str), Some("t.STATUS"));
        assert_eq!(
            mapping.get("owner").map(String::as_str),
            Some("t.ACTUAL_OWNER")
        );
    }

    #[test]
    fn unmapped_param_is_a_distinct_caller_error() {
        let strategies = QueryStrategies::standard();
        let descriptor = strategies.resolve("postgres").unwrap();

        let err = descriptor
            .column_mapping_for(["status", "priority"])
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingColumnMapping { ref column } if column == "priority"
        ));
    }
}
