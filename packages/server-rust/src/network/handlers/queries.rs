//! Read-side task query endpoint: `GET /queries/tasks`.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rulegrid_core::{Principal, RequestContext, ServiceResponse};
use serde::Deserialize;
use tracing::warn;

use crate::query::{QueryError, TaskQueryFilter};

use super::{AppState, ROLES_HEADER, USER_HEADER};

/// Query-string parameters of the task listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub created_after: Option<i64>,
}

pub async fn task_query_handler(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
    headers: HeaderMap,
) -> Response {
    let ctx = request_context(&state, &headers);
    let filter = TaskQueryFilter {
        status: params.status,
        owner: params.owner,
        created_after_ms: params.created_after,
        params: std::collections::BTreeMap::new(),
    };

    match state
        .tasks
        .tasks_for_caller(&ctx, params.page, params.page_size, &filter)
        .await
    {
        Ok(tasks) => Json(tasks).into_response(),
        Err(error) => {
            warn!(%error, "task query failed");
            let status = match error {
                QueryError::MissingColumnMapping { .. } => StatusCode::BAD_REQUEST,
                QueryError::UnsupportedBackend { .. } | QueryError::Backend(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(ServiceResponse::failure(error.to_string()))).into_response()
        }
    }
}

/// Projects the already-verified identity headers into a request context.
/// This never authenticates -- the upstream collaborator did.
fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let server_id = state.admin.server_id();
    match headers.get(USER_HEADER).and_then(|v| v.to_str().ok()) {
        Some(user) if !user.is_empty() => {
            let roles: Vec<String> = headers
                .get(ROLES_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|role| !role.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            RequestContext::authenticated(server_id, Principal::new(user, roles))
        }
        _ => RequestContext::anonymous(server_id),
    }
}
