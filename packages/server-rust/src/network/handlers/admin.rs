//! Container lifecycle and server info endpoints.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rulegrid_core::ServiceResponse;
use serde::Deserialize;
use tracing::warn;

use crate::service::AdminError;
use crate::state::ReleaseId;

use super::AppState;

/// Body of `PUT /containers/{container_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerRequest {
    pub release: ReleaseId,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

pub async fn create_container_handler(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    Json(body): Json<CreateContainerRequest>,
) -> Response {
    match state
        .admin
        .create_container(container_id, body.release, body.config)
    {
        Ok(descriptor) => (StatusCode::CREATED, Json(descriptor)).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

pub async fn dispose_container_handler(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Response {
    match state.admin.dispose_container(&container_id) {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

pub async fn start_container_handler(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Response {
    match state.admin.start_container(&container_id) {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

pub async fn stop_container_handler(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Response {
    match state.admin.stop_container(&container_id) {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

pub async fn list_containers_handler(State(state): State<AppState>) -> Response {
    match state.admin.list_containers() {
        Ok(containers) => Json(containers).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

pub async fn server_info_handler(State(state): State<AppState>) -> Response {
    match state.admin.server_info() {
        Ok(info) => Json(info).into_response(),
        Err(error) => admin_error_response(&error),
    }
}

fn admin_error_response(error: &AdminError) -> Response {
    let status = match error {
        AdminError::DuplicateContainer { .. } => StatusCode::CONFLICT,
        AdminError::UnknownContainer { .. } => StatusCode::NOT_FOUND,
        AdminError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%error, "admin operation failed");
    (status, Json(ServiceResponse::failure(error.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use crate::state::ContainerDescriptor;

    use super::super::testing;
    use super::*;

    fn create_body(artifact: &str) -> Json<CreateContainerRequest> {
        Json(CreateContainerRequest {
            release: ReleaseId::new(artifact, "1.0.0"),
            config: BTreeMap::new(),
        })
    }

    async fn body_of(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), 1 << 20).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn create_returns_201_with_descriptor() {
        let state = testing::state();
        let response = create_container_handler(
            State(state),
            Path("c2".to_string()),
            create_body("claims-rules"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let descriptor: ContainerDescriptor =
            serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(descriptor.container_id, "c2");
        assert!(descriptor.is_started());
    }

    #[tokio::test]
    async fn duplicate_create_is_409() {
        let state = testing::state();
        let response = create_container_handler(
            State(state),
            Path("c1".to_string()),
            create_body("orders-rules"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn dispose_unknown_is_404() {
        let state = testing::state();
        let response =
            dispose_container_handler(State(state), Path("ghost".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stop_then_start_toggles_status() {
        let state = testing::state();

        let response =
            stop_container_handler(State(state.clone()), Path("c1".to_string())).await;
        let descriptor: ContainerDescriptor =
            serde_json::from_slice(&body_of(response).await).unwrap();
        assert!(!descriptor.is_started());

        let response = start_container_handler(State(state), Path("c1".to_string())).await;
        let descriptor: ContainerDescriptor =
            serde_json::from_slice(&body_of(response).await).unwrap();
        assert!(descriptor.is_started());
    }

    #[tokio::test]
    async fn list_and_info_agree_on_container_count() {
        let state = testing::state();
        let response = list_containers_handler(State(state.clone())).await;
        let containers: Vec<ContainerDescriptor> =
            serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(containers.len(), 1);

        let response = server_info_handler(State(state)).await;
        let info: crate::service::ServerInfo =
            serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(info.containers, 1);
        assert_eq!(info.server_id, "srv-1");
    }
}
