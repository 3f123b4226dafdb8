//! Pluggable marshalling layer: one thread-safe codec per wire format.
//!
//! Codecs are registered once at startup and shared across every request
//! worker for the process lifetime, so they hold no mutable per-call state
//! and need no external locking.

pub mod json;
pub mod msgpack;
pub mod registry;

pub use json::JsonMarshaller;
pub use msgpack::MsgpackMarshaller;
pub use registry::MarshallerRegistry;

use rulegrid_core::{MarshallingFormat, PayloadKind, WirePayload};

/// Errors from the marshalling layer.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// No codec is bound for the format. Lookup never falls back to a
    /// default codec.
    #[error("no marshaller registered for format {format}")]
    UnknownFormat { format: MarshallingFormat },
    /// The payload bytes are not a valid encoding of the expected type.
    #[error("malformed {format} payload: {reason}")]
    Decode {
        format: MarshallingFormat,
        reason: String,
    },
    /// The payload could not be encoded.
    #[error("failed to encode {format} payload: {reason}")]
    Encode {
        format: MarshallingFormat,
        reason: String,
    },
}

/// A bidirectional converter between wire payloads and bytes for one format.
///
/// Implementations must be callable concurrently from multiple requests
/// without external synchronization: no mutable per-call state, and any
/// internal caches immutable after construction.
pub trait Marshaller: std::fmt::Debug + Send + Sync {
    /// The format this codec is bound to.
    fn format(&self) -> MarshallingFormat;

    /// Encodes a payload to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::Encode`] when the payload cannot be encoded.
    fn marshal(&self, payload: &WirePayload) -> Result<Vec<u8>, MarshalError>;

    /// Decodes wire bytes into the payload type named by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::Decode`] for malformed input -- never panics,
    /// whatever the bytes.
    fn unmarshal(&self, bytes: &[u8], kind: PayloadKind) -> Result<WirePayload, MarshalError>;

    /// Releases any codec-held resources. Idempotent.
    fn dispose(&self) {}
}
