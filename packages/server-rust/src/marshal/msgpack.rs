//! MessagePack codec backed by `rmp-serde`.
//!
//! Uses named-map serialization (`rmp_serde::to_vec_named`) so field names
//! appear on the wire and payloads stay readable by any MessagePack client.

use rulegrid_core::{
    ExecutionRequest, MarshallingFormat, PayloadKind, ServiceResponse, WirePayload,
};

use super::{MarshalError, Marshaller};

/// Stateless MessagePack codec. Safe to share across all request workers.
#[derive(Debug, Default)]
pub struct MsgpackMarshaller;

impl MsgpackMarshaller {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn decode_error(reason: impl ToString) -> MarshalError {
        MarshalError::Decode {
            format: MarshallingFormat::Msgpack,
            reason: reason.to_string(),
        }
    }
}

impl Marshaller for MsgpackMarshaller {
    fn format(&self) -> MarshallingFormat {
        MarshallingFormat::Msgpack
    }

    fn marshal(&self, payload: &WirePayload) -> Result<Vec<u8>, MarshalError> {
        let encoded = match payload {
            WirePayload::Request(request) => rmp_serde::to_vec_named(request),
            WirePayload::Response(response) => rmp_serde::to_vec_named(response),
        };
        encoded.map_err(|e| MarshalError::Encode {
            format: MarshallingFormat::Msgpack,
            reason: e.to_string(),
        })
    }

    fn unmarshal(&self, bytes: &[u8], kind: PayloadKind) -> Result<WirePayload, MarshalError> {
        match kind {
            PayloadKind::Request => rmp_serde::from_slice::<ExecutionRequest>(bytes)
                .map(WirePayload::Request)
                .map_err(Self::decode_error),
            PayloadKind::Response => rmp_serde::from_slice::<ServiceResponse>(bytes)
                .map(WirePayload::Response)
                .map_err(Self::decode_error),
        }
    }
}
