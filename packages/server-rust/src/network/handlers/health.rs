//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;

/// Returns detailed health information as JSON.
///
/// Always returns 200 -- the `state` field in the body says whether the
/// server is actually serving, so monitoring can tell "up but draining"
/// from "down".
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let containers = state
        .admin
        .server_info()
        .map(|info| info.containers)
        .unwrap_or_default();

    Json(json!({
        "state": state.lifecycle.phase().as_str(),
        "serverId": state.admin.server_id(),
        "containers": containers,
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe -- always returns 200 OK while the process responds.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe -- 200 while serving, 503 during startup and drain.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.lifecycle.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;

    #[tokio::test]
    async fn health_reports_phase_and_containers() {
        let state = testing::state();
        state.lifecycle.set_serving();

        let body = health_handler(State(state)).await.0;
        assert_eq!(body["state"], "serving");
        assert_eq!(body["serverId"], "srv-1");
        assert_eq!(body["containers"], 1);
        assert!(body["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn health_reports_starting_before_serve() {
        let state = testing::state();
        let body = health_handler(State(state)).await.0;
        assert_eq!(body["state"], "starting");
    }

    #[tokio::test]
    async fn liveness_always_ok() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_tracks_lifecycle() {
        let state = testing::state();
        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.lifecycle.set_serving();
        assert_eq!(readiness_handler(State(state.clone())).await, StatusCode::OK);

        state.lifecycle.begin_drain();
        assert_eq!(
            readiness_handler(State(state)).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
