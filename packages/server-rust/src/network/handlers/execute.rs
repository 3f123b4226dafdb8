//! Container execution endpoint: `POST /containers/{container_id}`.
//!
//! The marshalling format comes from the request's `Content-Type`; the
//! response is always encoded in the same format. Dispatch failures come
//! back as structured `ServiceResponse` failures, in the request format
//! when its codec is registered and as plain JSON otherwise.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use rulegrid_core::envelope::headers as wire_headers;
use rulegrid_core::{Envelope, MarshallingFormat, ServiceResponse};
use tracing::warn;

use crate::service::RouteError;

use super::AppState;

pub async fn execute_handler(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let Some(format) = MarshallingFormat::from_content_type(content_type) else {
        warn!(content_type, "rejected request with unsupported marshalling format");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ServiceResponse::failure(format!(
                "unsupported marshalling format '{content_type}'"
            ))),
        )
            .into_response();
    };

    let mut envelope = Envelope::request(format, container_id, body.to_vec());
    if let Some(correlation) = headers
        .get(wire_headers::CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
    {
        envelope = envelope.with_correlation_id(correlation);
    }

    match state.router.dispatch(&envelope).await {
        Ok(response) => (
            [(header::CONTENT_TYPE, format.content_type())],
            response.payload,
        )
            .into_response(),
        Err(error) => route_error_response(&state, &envelope, &error),
    }
}

/// Maps a dispatch failure to a transport status plus a structured body.
pub(crate) fn route_error_response(
    state: &AppState,
    envelope: &Envelope,
    error: &RouteError,
) -> Response {
    let status = match error {
        RouteError::UnknownFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        RouteError::UnknownContainer { .. } => StatusCode::NOT_FOUND,
        RouteError::Decode(_) => StatusCode::BAD_REQUEST,
        RouteError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RouteError::Encode(_) | RouteError::State(_) | RouteError::Engine(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!(%error, container_id = %envelope.container_id, "request dispatch failed");

    match state.router.failure_reply(envelope, error) {
        Some(reply) => (
            status,
            [(header::CONTENT_TYPE, envelope.format.content_type())],
            reply.payload,
        )
            .into_response(),
        None => (status, Json(ServiceResponse::failure(error.to_string()))).into_response(),
    }
}
