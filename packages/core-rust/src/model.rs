//! Execution request/result model shared by the server and its clients.
//!
//! Requests are command batches decoded from envelope payloads; results are
//! the engine's native representation, converted to the wire shape by
//! [`results`](crate::results) before encoding. All wire-facing types use
//! internally-tagged serde enums with SCREAMING discriminators and
//! camelCase field names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::results::WireResults;
use crate::value::Value;

/// A single engine command inside an [`ExecutionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineCommand {
    /// Insert a fact into the container's working memory.
    #[serde(rename = "INSERT", rename_all = "camelCase")]
    Insert {
        /// Name under which the inserted fact is returned, if requested.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        out_identifier: Option<String>,
        /// The fact payload.
        value: Value,
        /// Whether the fact value itself is echoed in the results.
        #[serde(default)]
        return_object: bool,
    },
    /// Bind a global value in the container.
    #[serde(rename = "SET_GLOBAL", rename_all = "camelCase")]
    SetGlobal { identifier: String, value: Value },
    /// Read a global value from the container.
    #[serde(rename = "GET_GLOBAL", rename_all = "camelCase")]
    GetGlobal {
        identifier: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        out_identifier: Option<String>,
    },
    /// Fire all activated rules.
    #[serde(rename = "FIRE_ALL_RULES", rename_all = "camelCase")]
    FireAllRules {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        out_identifier: Option<String>,
        /// Upper bound on rule firings; unbounded when absent.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        max: Option<i64>,
    },
    /// Run a named query against the container.
    #[serde(rename = "QUERY", rename_all = "camelCase")]
    Query {
        name: String,
        out_identifier: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

/// A batch of commands addressed to one container session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// Named session to execute against; the container default when absent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lookup: Option<String>,
    pub commands: Vec<EngineCommand>,
}

/// Opaque reference to a fact held by the engine.
///
/// Fact handles have no wire-level behavior; only their external form is
/// carried, so callers can hand them back to the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactHandle(String);

impl FactHandle {
    /// Wraps an external form produced by the engine.
    #[must_use]
    pub fn new(external_form: impl Into<String>) -> Self {
        Self(external_form.into())
    }

    /// The engine-issued external form.
    #[must_use]
    pub fn external_form(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The engine's native execution result.
///
/// Owned exclusively by the request that produced it; the wire adapter in
/// [`results`](crate::results) converts it by value transform and never
/// retains a reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionResults {
    /// Named output values keyed by out-identifier.
    pub results: BTreeMap<String, Value>,
    /// Fact handles keyed by out-identifier.
    pub fact_handles: BTreeMap<String, FactHandle>,
}

impl ExecutionResults {
    /// Records a named output value.
    pub fn insert_result(&mut self, key: impl Into<String>, value: Value) {
        self.results.insert(key.into(), value);
    }

    /// Records a fact handle for a named output.
    pub fn insert_fact_handle(&mut self, key: impl Into<String>, handle: FactHandle) {
        self.fact_handles.insert(key.into(), handle);
    }

    /// Looks up a named output value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.results.get(key)
    }

    /// Looks up a named fact handle.
    #[must_use]
    pub fn fact_handle(&self, key: &str) -> Option<&FactHandle> {
        self.fact_handles.get(key)
    }

    /// `true` when the execution produced no outputs at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.fact_handles.is_empty()
    }
}

/// Outcome discriminator for [`ServiceResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
}

/// Uniform response body returned on every transport.
///
/// Failures carry a descriptive message and no result; this is the
/// structured error response shape -- decode and execution errors never
/// surface as a bare transport crash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<WireResults>,
}

impl ServiceResponse {
    /// Builds a success response.
    #[must_use]
    pub fn success(msg: impl Into<String>, result: Option<WireResults>) -> Self {
        Self {
            response_type: ResponseType::Success,
            msg: msg.into(),
            result,
        }
    }

    /// Builds a failure response.
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Failure,
            msg: msg.into(),
            result: None,
        }
    }

    /// `true` when the response reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }
}

/// One row of the read-side task listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub task_id: i64,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actual_owner: Option<String>,
    pub container_id: String,
    pub created_at_ms: i64,
}

/// A decoded envelope payload: the two wire types codecs understand.
#[derive(Debug, Clone, PartialEq)]
pub enum WirePayload {
    Request(ExecutionRequest),
    Response(ServiceResponse),
}

impl WirePayload {
    /// The payload-type hint matching this payload.
    #[must_use]
    pub fn kind(&self) -> crate::envelope::PayloadKind {
        match self {
            Self::Request(_) => crate::envelope::PayloadKind::Request,
            Self::Response(_) => crate::envelope::PayloadKind::Response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> ExecutionRequest {
        ExecutionRequest {
            lookup: Some("default-session".to_string()),
            commands: vec![
                EngineCommand::Insert {
                    out_identifier: Some("person".to_string()),
                    value: Value::from("alice"),
                    return_object: true,
                },
                EngineCommand::SetGlobal {
                    identifier: "threshold".to_string(),
                    value: Value::Int(10),
                },
                EngineCommand::FireAllRules {
                    out_identifier: Some("fired".to_string()),
                    max: None,
                },
                EngineCommand::Query {
                    name: "open-orders".to_string(),
                    out_identifier: "orders".to_string(),
                    args: vec![Value::Int(7)],
                },
            ],
        }
    }

    #[test]
    fn request_round_trip_json() {
        let request = sample_request();
        let text = serde_json::to_string(&request).expect("serialize");
        let decoded: ExecutionRequest = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(request, decoded);
    }

    #[test]
    fn request_round_trip_msgpack() {
        let request = sample_request();
        let bytes = rmp_serde::to_vec_named(&request).expect("serialize");
        let decoded: ExecutionRequest = rmp_serde::from_slice(&bytes).expect("deserialize");
        assert_eq!(request, decoded);
    }

    #[test]
    fn command_serializes_with_type_discriminator() {
        let command = EngineCommand::FireAllRules {
            out_identifier: None,
            max: Some(100),
        };
        let text = serde_json::to_string(&command).unwrap();
        assert!(text.contains("\"type\":\"FIRE_ALL_RULES\""), "got: {text}");
        assert!(text.contains("\"max\":100"), "got: {text}");
    }

    #[test]
    fn insert_uses_camel_case_field_names() {
        let command = EngineCommand::Insert {
            out_identifier: Some("x".to_string()),
            value: Value::Null,
            return_object: false,
        };
        let text = serde_json::to_string(&command).unwrap();
        assert!(text.contains("\"outIdentifier\""), "got: {text}");
        assert!(text.contains("\"returnObject\""), "got: {text}");
    }

    #[test]
    fn service_response_type_field_on_the_wire() {
        let response = ServiceResponse::failure("container missing is not deployed");
        let text = serde_json::to_string(&response).unwrap();
        assert!(text.contains("\"type\":\"FAILURE\""), "got: {text}");
        // No result key when there is no result.
        assert!(!text.contains("\"result\""), "got: {text}");
    }

    #[test]
    fn service_response_round_trip_msgpack() {
        let response = ServiceResponse::success("ok", None);
        let bytes = rmp_serde::to_vec_named(&response).expect("serialize");
        let decoded: ServiceResponse = rmp_serde::from_slice(&bytes).expect("deserialize");
        assert_eq!(response, decoded);
        assert!(decoded.is_success());
    }

    #[test]
    fn fact_handle_is_transparent_on_the_wire() {
        let handle = FactHandle::new("0:42:c1");
        let text = serde_json::to_string(&handle).unwrap();
        assert_eq!(text, "\"0:42:c1\"");
        let decoded: FactHandle = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded.external_form(), "0:42:c1");
    }

    #[test]
    fn execution_results_accessors() {
        let mut results = ExecutionResults::default();
        assert!(results.is_empty());

        results.insert_result("out", Value::Int(1));
        results.insert_fact_handle("fact", FactHandle::new("0:1:c1"));

        assert_eq!(results.value("out"), Some(&Value::Int(1)));
        assert_eq!(
            results.fact_handle("fact").map(FactHandle::external_form),
            Some("0:1:c1")
        );
        assert!(!results.is_empty());
    }

    #[test]
    fn task_summary_round_trip() {
        let task = TaskSummary {
            task_id: 42,
            name: "approve-order".to_string(),
            status: "Reserved".to_string(),
            actual_owner: Some("alice".to_string()),
            container_id: "c1".to_string(),
            created_at_ms: 1_700_000_000_000,
        };
        let text = serde_json::to_string(&task).unwrap();
        assert!(text.contains("\"taskId\":42"), "got: {text}");
        let decoded: TaskSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(task, decoded);
    }

    #[test]
    fn wire_payload_kind_matches_variant() {
        use crate::envelope::PayloadKind;

        let request = WirePayload::Request(ExecutionRequest::default());
        assert_eq!(request.kind(), PayloadKind::Request);

        let response = WirePayload::Response(ServiceResponse::success("ok", None));
        assert_eq!(response.kind(), PayloadKind::Response);
    }
}
