//! Marshalling format tokens shared by every transport.
//!
//! A format token identifies exactly one codec binding in the server's
//! marshaller registry. Tokens travel as message headers on the queue
//! transport and as `Content-Type` values on HTTP, so both spellings are
//! parsed here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialization format for request and response payloads.
///
/// Exactly one codec is bound per format at registry construction; the
/// binding is immutable for the process lifetime. Unknown tokens never fall
/// back to a default -- callers surface them as errors before any decode
/// work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarshallingFormat {
    /// JSON text payloads (`application/json`).
    #[serde(rename = "JSON")]
    Json,
    /// MessagePack binary payloads with named map keys (`application/msgpack`).
    #[serde(rename = "MSGPACK")]
    Msgpack,
}

impl MarshallingFormat {
    /// Parses a header token such as `"JSON"` or `"MSGPACK"` (case-insensitive).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "JSON" => Some(Self::Json),
            "MSGPACK" | "MSG_PACK" => Some(Self::Msgpack),
            _ => None,
        }
    }

    /// The canonical header token for this format.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Msgpack => "MSGPACK",
        }
    }

    /// The HTTP content type carrying this format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Msgpack => "application/msgpack",
        }
    }

    /// Parses an HTTP `Content-Type` value, ignoring any parameters
    /// (`application/json; charset=utf-8` resolves to JSON).
    #[must_use]
    pub fn from_content_type(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/json" => Some(Self::Json),
            "application/msgpack" | "application/x-msgpack" => Some(Self::Msgpack),
            _ => None,
        }
    }
}

impl fmt::Display for MarshallingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        for format in [MarshallingFormat::Json, MarshallingFormat::Msgpack] {
            assert_eq!(MarshallingFormat::from_token(format.token()), Some(format));
        }
    }

    #[test]
    fn from_token_is_case_insensitive() {
        assert_eq!(
            MarshallingFormat::from_token("json"),
            Some(MarshallingFormat::Json)
        );
        assert_eq!(
            MarshallingFormat::from_token(" MsgPack "),
            Some(MarshallingFormat::Msgpack)
        );
    }

    #[test]
    fn unknown_token_is_rejected_not_defaulted() {
        assert_eq!(MarshallingFormat::from_token("XML"), None);
        assert_eq!(MarshallingFormat::from_token("PROTOBUF"), None);
        assert_eq!(MarshallingFormat::from_token(""), None);
    }

    #[test]
    fn content_type_round_trip() {
        for format in [MarshallingFormat::Json, MarshallingFormat::Msgpack] {
            assert_eq!(
                MarshallingFormat::from_content_type(format.content_type()),
                Some(format)
            );
        }
    }

    #[test]
    fn content_type_ignores_parameters() {
        assert_eq!(
            MarshallingFormat::from_content_type("application/json; charset=utf-8"),
            Some(MarshallingFormat::Json)
        );
        assert_eq!(
            MarshallingFormat::from_content_type("application/x-msgpack"),
            Some(MarshallingFormat::Msgpack)
        );
        assert_eq!(MarshallingFormat::from_content_type("text/xml"), None);
    }

    #[test]
    fn serializes_as_screaming_token() {
        let json = serde_json::to_string(&MarshallingFormat::Msgpack).unwrap();
        assert_eq!(json, "\"MSGPACK\"");
    }
}
