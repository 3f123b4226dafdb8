//! Envelope routing: resolves codec and container, then dispatches to the
//! engine.
//!
//! Resolution happens before any payload decoding so requests that cannot
//! be serviced fail fast with a distinct error and no wasted decode work.
//! The response is always encoded with the same format the request carried.

use std::sync::Arc;
use std::time::Duration;

use rulegrid_core::{
    to_wire, Envelope, MarshallingFormat, PayloadKind, ServiceResponse, WirePayload,
};
use tracing::{debug, warn};

use crate::marshal::{MarshalError, MarshallerRegistry};
use crate::state::{StateError, StateRepository};
use crate::traits::ContainerEngine;

/// Errors from dispatching one envelope.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The request's format token has no registered codec.
    #[error("no marshaller registered for format {format}")]
    UnknownFormat { format: MarshallingFormat },
    /// The target container is absent or not started.
    #[error("container {container_id} is not deployed or not started")]
    UnknownContainer { container_id: String },
    /// The payload could not be decoded with the resolved codec.
    #[error("failed to decode request payload: {0}")]
    Decode(#[source] MarshalError),
    /// The response could not be encoded.
    #[error("failed to encode response payload: {0}")]
    Encode(#[source] MarshalError),
    /// The state repository failed while resolving the container.
    #[error(transparent)]
    State(#[from] StateError),
    /// The container execution itself failed.
    #[error("container execution failed: {0}")]
    Engine(#[source] anyhow::Error),
    /// The container did not produce a result within the configured timeout.
    #[error("container execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Routes envelopes from any transport to the right container and codec.
///
/// The router never mutates server state -- container mutations flow through
/// [`ServerAdmin`](crate::service::ServerAdmin).
pub struct RequestRouter {
    server_id: String,
    marshallers: Arc<MarshallerRegistry>,
    state: Arc<dyn StateRepository>,
    engine: Arc<dyn ContainerEngine>,
    call_timeout: Duration,
}

impl RequestRouter {
    #[must_use]
    pub fn new(
        server_id: impl Into<String>,
        marshallers: Arc<MarshallerRegistry>,
        state: Arc<dyn StateRepository>,
        engine: Arc<dyn ContainerEngine>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            marshallers,
            state,
            engine,
            call_timeout,
        }
    }

    /// The server id whose state this router resolves containers against.
    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Dispatches one request envelope and returns the response envelope.
    ///
    /// Resolution order: codec, then container, then payload decode, then
    /// execution under the configured timeout. The response envelope always
    /// carries the request's format.
    ///
    /// # Errors
    ///
    /// See [`RouteError`]; resolution errors are returned before any decode
    /// or execution work happens.
    pub async fn dispatch(&self, envelope: &Envelope) -> Result<Envelope, RouteError> {
        let marshaller = self
            .marshallers
            .resolve(envelope.format)
            .map_err(|_| RouteError::UnknownFormat {
                format: envelope.format,
            })?;

        let state = self.state.load(&self.server_id)?;
        let container_started = state
            .as_ref()
            .and_then(|s| s.container(&envelope.container_id))
            .is_some_and(crate::state::ContainerDescriptor::is_started);
        if !container_started {
            return Err(RouteError::UnknownContainer {
                container_id: envelope.container_id.clone(),
            });
        }

        let payload = marshaller
            .unmarshal(&envelope.payload, PayloadKind::Request)
            .map_err(RouteError::Decode)?;
        let WirePayload::Request(request) = payload else {
            return Err(RouteError::Decode(MarshalError::Decode {
                format: envelope.format,
                reason: "expected a request payload".to_string(),
            }));
        };

        debug!(
            container_id = %envelope.container_id,
            format = %envelope.format,
            commands = request.commands.len(),
            "dispatching execution request"
        );

        let timeout_ms = u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX);
        let outcome = tokio::time::timeout(
            self.call_timeout,
            self.engine.execute(&envelope.container_id, request),
        )
        .await
        .map_err(|_| RouteError::Timeout { timeout_ms })?;
        let results = outcome.map_err(RouteError::Engine)?;

        let response = ServiceResponse::success(
            format!("container {} successfully called", envelope.container_id),
            Some(to_wire(&results)),
        );
        let bytes = marshaller
            .marshal(&WirePayload::Response(response))
            .map_err(RouteError::Encode)?;
        Ok(envelope.reply(bytes))
    }

    /// Encodes a structured failure response in the request's format.
    ///
    /// Returns `None` when the request's format has no registered codec or
    /// the failure itself cannot be encoded -- the transport then falls back
    /// to its own error shape.
    #[must_use]
    pub fn failure_reply(&self, envelope: &Envelope, error: &RouteError) -> Option<Envelope> {
        let marshaller = self.marshallers.resolve(envelope.format).ok()?;
        let response = ServiceResponse::failure(error.to_string());
        match marshaller.marshal(&WirePayload::Response(response)) {
            Ok(bytes) => Some(envelope.reply(bytes)),
            Err(encode_error) => {
                warn!(%encode_error, "failed to encode failure response");
                None
            }
        }
    }
}
