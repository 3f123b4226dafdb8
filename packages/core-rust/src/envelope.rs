//! Transport-agnostic request/response wrapper.
//!
//! Every transport delivers the same `Envelope` shape to the router: a
//! format token, a target container id, a payload-type hint, and the raw
//! payload bytes. The queue transport carries the first three as string
//! message headers; the constants in [`headers`] name them.

use serde::{Deserialize, Serialize};

use crate::formats::MarshallingFormat;

/// Header names used by the message-queue transport (and accepted on HTTP).
pub mod headers {
    /// Serialization format token, e.g. `JSON` or `MSGPACK`.
    pub const FORMAT: &str = "X-RuleGrid-Format";
    /// Target container id.
    pub const CONTAINER_ID: &str = "X-RuleGrid-Container-Id";
    /// Payload-type hint, e.g. `REQUEST` or `RESPONSE`.
    pub const CLASS_TYPE: &str = "X-RuleGrid-Class-Type";
    /// Correlation id used to match a response to its request.
    pub const CORRELATION_ID: &str = "X-RuleGrid-Correlation-Id";
}

/// Payload-type hint carried alongside the payload bytes.
///
/// Tells the codec which wire type to decode without sniffing the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// The payload is an [`ExecutionRequest`](crate::model::ExecutionRequest).
    #[serde(rename = "REQUEST")]
    Request,
    /// The payload is a [`ServiceResponse`](crate::model::ServiceResponse).
    #[serde(rename = "RESPONSE")]
    Response,
}

impl PayloadKind {
    /// Parses a class-type header token (case-insensitive).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "REQUEST" => Some(Self::Request),
            "RESPONSE" => Some(Self::Response),
            _ => None,
        }
    }

    /// The canonical header token for this kind.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Response => "RESPONSE",
        }
    }
}

/// The transport-agnostic message wrapper.
///
/// Transient: envelopes live for the duration of a single request/response
/// exchange and are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Serialization format of `payload`. Must resolve to a registered codec
    /// before the payload is decoded.
    pub format: MarshallingFormat,
    /// Target container id.
    pub container_id: String,
    /// Payload-type hint.
    pub payload_kind: PayloadKind,
    /// Raw payload bytes in the declared format.
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    /// Correlation id, echoed on the response for reply routing.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlation_id: Option<String>,
}

impl Envelope {
    /// Creates a request envelope.
    #[must_use]
    pub fn request(
        format: MarshallingFormat,
        container_id: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            format,
            container_id: container_id.into(),
            payload_kind: PayloadKind::Request,
            payload,
            correlation_id: None,
        }
    }

    /// Attaches a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builds the response envelope for this request.
    ///
    /// The response always carries the same format and container id as the
    /// request, and echoes its correlation id.
    #[must_use]
    pub fn reply(&self, payload: Vec<u8>) -> Self {
        Self {
            format: self.format,
            container_id: self.container_id.clone(),
            payload_kind: PayloadKind::Response,
            payload,
            correlation_id: self.correlation_id.clone(),
        }
    }
}
