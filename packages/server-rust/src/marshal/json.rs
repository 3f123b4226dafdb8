//! JSON codec backed by `serde_json`.

use rulegrid_core::{
    ExecutionRequest, MarshallingFormat, PayloadKind, ServiceResponse, WirePayload,
};

use super::{MarshalError, Marshaller};

/// Stateless JSON codec. Safe to share across all request workers.
#[derive(Debug, Default)]
pub struct JsonMarshaller;

impl JsonMarshaller {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn decode_error(reason: impl ToString) -> MarshalError {
        MarshalError::Decode {
            format: MarshallingFormat::Json,
            reason: reason.to_string(),
        }
    }
}

impl Marshaller for JsonMarshaller {
    fn format(&self) -> MarshallingFormat {
        MarshallingFormat::Json
    }

    fn marshal(&self, payload: &WirePayload) -> Result<Vec<u8>, MarshalError> {
        let encoded = match payload {
            WirePayload::Request(request) => serde_json::to_vec(request),
            WirePayload::Response(response) => serde_json::to_vec(response),
        };
        encoded.map_err(|e| MarshalError::Encode {
            format: MarshallingFormat::Json,
            reason: e.to_string(),
        })
    }

    fn unmarshal(&self, bytes: &[u8], kind: PayloadKind) -> Result<WirePayload, MarshalError> {
        match kind {
            PayloadKind::Request => serde_json::from_slice::<ExecutionRequest>(bytes)
                .map(WirePayload::Request)
                .map_err(Self::decode_error),
            PayloadKind::Response => serde_json::from_slice::<ServiceResponse>(bytes)
                .map(WirePayload::Response)
                .map_err(Self::decode_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use rulegrid_core::{EngineCommand, Value};

    use super::*;

    fn sample_request() -> ExecutionRequest {
        ExecutionRequest {
            lookup: None,
            commands: vec![EngineCommand::Insert {
                out_identifier: Some("person".to_string()),
                value: Value::from("alice"),
                return_object: true,
            }],
        }
    }

    #[test]
    fn request_round_trip() {
        let codec = JsonMarshaller::new();
        let payload = WirePayload::Request(sample_request());

        let bytes = codec.marshal(&payload).expect("marshal");
        let decoded = codec
            .unmarshal(&bytes, PayloadKind::Request)
            .expect("unmarshal");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn response_round_trip() {
        let codec = JsonMarshaller::new();
        let payload = WirePayload::Response(ServiceResponse::success("ok", None));

        let bytes = codec.marshal(&payload).expect("marshal");
        let decoded = codec
            .unmarshal(&bytes, PayloadKind::Response)
            .expect("unmarshal");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn malformed_input_yields_decode_error() {
        let codec = JsonMarshaller::new();
        let err = codec
            .unmarshal(b"{not json", PayloadKind::Request)
            .unwrap_err();
        assert!(matches!(
            err,
            MarshalError::Decode {
                format: MarshallingFormat::Json,
                ..
            }
        ));
        // The error message is descriptive, not a bare code.
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn wrong_shape_yields_decode_error() {
        let codec = JsonMarshaller::new();
        // Valid JSON, but not an ExecutionRequest.
        let err = codec
            .unmarshal(b"[1, 2, 3]", PayloadKind::Request)
            .unwrap_err();
        assert!(matches!(err, MarshalError::Decode { .. }));
    }

    #[test]
    fn concurrent_marshal_from_many_threads() {
        let codec = JsonMarshaller::new();
        let payload = WirePayload::Request(sample_request());
        let expected = codec.marshal(&payload).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let bytes = codec.marshal(&payload).expect("marshal");
                        assert_eq!(bytes, expected);
                        let decoded = codec
                            .unmarshal(&bytes, PayloadKind::Request)
                            .expect("unmarshal");
                        assert_eq!(decoded, payload);
                    }
                });
            }
        });
    }
}
