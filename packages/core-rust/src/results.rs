//! Wire representation of execution results and the adapter to/from the
//! engine-native form.
//!
//! The adapter is a pure structural transform: no business logic, no
//! retained references, inverse up to semantic equality. That keeps it
//! independently testable via the round-trip property below.

use serde::{Deserialize, Serialize};

use crate::model::{ExecutionResults, FactHandle};
use crate::value::Value;

/// One named output value on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResultItem {
    pub key: String,
    pub value: Value,
}

/// One named fact-handle reference on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFactHandleItem {
    pub key: String,
    pub handle: FactHandle,
}

/// Codec-neutral wire shape of [`ExecutionResults`].
///
/// Items are ordered by key (the native form's `BTreeMap` order) so the
/// encoded bytes are deterministic for a given result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResults {
    pub items: Vec<WireResultItem>,
    pub fact_handles: Vec<WireFactHandleItem>,
}

/// Converts the engine-native result into its wire shape.
#[must_use]
pub fn to_wire(results: &ExecutionResults) -> WireResults {
    WireResults {
        items: results
            .results
            .iter()
            .map(|(key, value)| WireResultItem {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
        fact_handles: results
            .fact_handles
            .iter()
            .map(|(key, handle)| WireFactHandleItem {
                key: key.clone(),
                handle: handle.clone(),
            })
            .collect(),
    }
}

/// Rebuilds the engine-native result from its wire shape.
#[must_use]
pub fn from_wire(wire: &WireResults) -> ExecutionResults {
    let mut results = ExecutionResults::default();
    for item in &wire.items {
        results.insert_result(item.key.clone(), item.value.clone());
    }
    for item in &wire.fact_handles {
        results.insert_fact_handle(item.key.clone(), item.handle.clone());
    }
    results
}
