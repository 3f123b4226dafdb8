//! Asynchronous message-queue transport.
//!
//! A consumer loop reads request messages from a bounded channel, rebuilds
//! the transport-agnostic envelope from the message headers (serialization
//! format, container id, class-type hint), dispatches through the shared
//! router, and replies on the response channel with the same correlation
//! id. Malformed headers produce structured failure replies -- the worker
//! never crashes on bad input.

use std::collections::BTreeMap;
use std::sync::Arc;

use rulegrid_core::{
    headers, Envelope, MarshallingFormat, PayloadKind, ServiceResponse, WirePayload,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::marshal::{JsonMarshaller, Marshaller};
use crate::network::config::QueueConfig;
use crate::service::RequestRouter;

/// One message on the queue, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// String headers; see [`rulegrid_core::headers`] for the names.
    pub headers: BTreeMap<String, String>,
    /// Matches a response to its request.
    pub correlation_id: String,
    /// Payload bytes in the format named by the format header.
    pub payload: Vec<u8>,
}

impl QueueMessage {
    /// Builds a request message with a fresh correlation id.
    #[must_use]
    pub fn request(
        format: MarshallingFormat,
        container_id: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        let mut message_headers = BTreeMap::new();
        message_headers.insert(headers::FORMAT.to_string(), format.token().to_string());
        message_headers.insert(headers::CONTAINER_ID.to_string(), container_id.into());
        message_headers.insert(
            headers::CLASS_TYPE.to_string(),
            PayloadKind::Request.token().to_string(),
        );
        Self {
            headers: message_headers,
            correlation_id: uuid::Uuid::new_v4().to_string(),
            payload,
        }
    }

    /// Reads a header by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn from_envelope(envelope: &Envelope) -> Self {
        let mut message_headers = BTreeMap::new();
        message_headers.insert(
            headers::FORMAT.to_string(),
            envelope.format.token().to_string(),
        );
        message_headers.insert(
            headers::CONTAINER_ID.to_string(),
            envelope.container_id.clone(),
        );
        message_headers.insert(
            headers::CLASS_TYPE.to_string(),
            envelope.payload_kind.token().to_string(),
        );
        Self {
            headers: message_headers,
            correlation_id: envelope
                .correlation_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            payload: envelope.payload.clone(),
        }
    }
}

/// The queue transport endpoint: a consumer loop over an mpsc channel pair.
pub struct QueueEndpoint {
    requests: mpsc::Sender<QueueMessage>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl QueueEndpoint {
    /// Starts the consumer loop. Returns the endpoint handle and the
    /// response channel receiver.
    #[must_use]
    pub fn start(
        router: Arc<RequestRouter>,
        config: &QueueConfig,
    ) -> (Self, mpsc::Receiver<QueueMessage>) {
        let (request_tx, mut request_rx) = mpsc::channel::<QueueMessage>(config.request_capacity);
        let (response_tx, response_rx) = mpsc::channel::<QueueMessage>(config.response_capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = request_rx.recv() => {
                        let Some(message) = message else { break };
                        let reply = handle_message(&router, message).await;
                        if response_tx.send(reply).await.is_err() {
                            // Response consumer went away; nothing left to serve.
                            break;
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
            debug!("queue consumer loop stopped");
        });

        (
            Self {
                requests: request_tx,
                shutdown: Some(shutdown_tx),
                handle: Some(handle),
            },
            response_rx,
        )
    }

    /// Sender side of the request channel, for producers.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<QueueMessage> {
        self.requests.clone()
    }

    /// Stops the consumer loop and waits for it to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn handle_message(router: &RequestRouter, message: QueueMessage) -> QueueMessage {
    let envelope = match envelope_from_message(&message) {
        Ok(envelope) => envelope,
        Err(reason) => {
            warn!(correlation_id = %message.correlation_id, reason, "rejected queue message");
            return failure_message(&message, &reason);
        }
    };

    match router.dispatch(&envelope).await {
        Ok(response) => QueueMessage::from_envelope(&response),
        Err(error) => {
            warn!(
                correlation_id = %message.correlation_id,
                %error,
                "queue request dispatch failed"
            );
            router
                .failure_reply(&envelope, &error)
                .map_or_else(
                    || failure_message(&message, &error.to_string()),
                    |reply| QueueMessage::from_envelope(&reply),
                )
        }
    }
}

fn envelope_from_message(message: &QueueMessage) -> Result<Envelope, String> {
    let format_token = message
        .header(headers::FORMAT)
        .ok_or_else(|| format!("missing {} header", headers::FORMAT))?;
    let format = MarshallingFormat::from_token(format_token)
        .ok_or_else(|| format!("unsupported marshalling format '{format_token}'"))?;

    let container_id = message
        .header(headers::CONTAINER_ID)
        .ok_or_else(|| format!("missing {} header", headers::CONTAINER_ID))?;

    if let Some(class_type) = message.header(headers::CLASS_TYPE) {
        match PayloadKind::from_token(class_type) {
            Some(PayloadKind::Request) => {}
            Some(PayloadKind::Response) => {
                return Err("queue endpoint accepts request payloads only".to_string())
            }
            None => return Err(format!("unsupported class type '{class_type}'")),
        }
    }

    Ok(
        Envelope::request(format, container_id, message.payload.clone())
            .with_correlation_id(message.correlation_id.clone()),
    )
}

/// Failure reply for messages whose format header never resolved: encoded
/// as JSON, the documented default for header-level failures.
fn failure_message(original: &QueueMessage, reason: &str) -> QueueMessage {
    let response = ServiceResponse::failure(reason);
    let payload = JsonMarshaller::new()
        .marshal(&WirePayload::Response(response))
        .unwrap_or_default();

    let mut message_headers = BTreeMap::new();
    message_headers.insert(
        headers::FORMAT.to_string(),
        MarshallingFormat::Json.token().to_string(),
    );
    if let Some(container_id) = original.header(headers::CONTAINER_ID) {
        message_headers.insert(headers::CONTAINER_ID.to_string(), container_id.to_string());
    }
    message_headers.insert(
        headers::CLASS_TYPE.to_string(),
        PayloadKind::Response.token().to_string(),
    );

    QueueMessage {
        headers: message_headers,
        correlation_id: original.correlation_id.clone(),
        payload,
    }
}
