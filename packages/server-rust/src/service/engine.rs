//! Built-in [`ContainerEngine`] used when no real engine is wired in.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rulegrid_core::{EngineCommand, ExecutionRequest, ExecutionResults, FactHandle, Value};

use crate::traits::ContainerEngine;

/// Engine stand-in for tests and local development.
///
/// Interprets the command batch structurally: inserts are acknowledged with
/// synthetic fact handles, globals live for the duration of one request,
/// fire-all-rules reports the number of facts inserted so far, and queries
/// echo their arguments. No rules are ever evaluated.
#[derive(Debug, Default)]
pub struct NullEngine;

#[async_trait]
impl ContainerEngine for NullEngine {
    async fn execute(
        &self,
        container_id: &str,
        request: ExecutionRequest,
    ) -> anyhow::Result<ExecutionResults> {
        let mut results = ExecutionResults::default();
        let mut globals: BTreeMap<String, Value> = BTreeMap::new();
        let mut inserted: i64 = 0;

        for command in request.commands {
            match command {
                EngineCommand::Insert {
                    out_identifier,
                    value,
                    return_object,
                } => {
                    inserted += 1;
                    if let Some(out) = out_identifier {
                        results.insert_fact_handle(
                            out.clone(),
                            FactHandle::new(format!("0:{inserted}:{container_id}")),
                        );
                        if return_object {
                            results.insert_result(out, value);
                        }
                    }
                }
                EngineCommand::SetGlobal { identifier, value } => {
                    globals.insert(identifier, value);
                }
                EngineCommand::GetGlobal {
                    identifier,
                    out_identifier,
                } => {
                    let out = out_identifier.unwrap_or_else(|| identifier.clone());
                    let value = globals.get(&identifier).cloned().unwrap_or(Value::Null);
                    results.insert_result(out, value);
                }
                EngineCommand::FireAllRules { out_identifier, max } => {
                    let fired = max.map_or(inserted, |m| inserted.min(m.max(0)));
                    if let Some(out) = out_identifier {
                        results.insert_result(out, Value::Int(fired));
                    }
                }
                EngineCommand::Query {
                    name: _,
                    out_identifier,
                    args,
                } => {
                    results.insert_result(out_identifier, Value::Array(args));
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_produces_handle_and_optionally_echoes_value() {
        let engine = NullEngine;
        let request = ExecutionRequest {
            lookup: None,
            commands: vec![
                EngineCommand::Insert {
                    out_identifier: Some("a".to_string()),
                    value: Value::from("fact-a"),
                    return_object: true,
                },
                EngineCommand::Insert {
                    out_identifier: Some("b".to_string()),
                    value: Value::from("fact-b"),
                    return_object: false,
                },
            ],
        };

        let results = engine.execute("c1", request).await.unwrap();
        assert_eq!(results.value("a"), Some(&Value::from("fact-a")));
        assert!(results.value("b").is_none());
        assert_eq!(
            results.fact_handle("a").map(FactHandle::external_form),
            Some("0:1:c1")
        );
        assert_eq!(
            results.fact_handle("b").map(FactHandle::external_form),
            Some("0:2:c1")
        );
    }

    #[tokio::test]
    async fn globals_are_scoped_to_one_request() {
        let engine = NullEngine;
        let request = ExecutionRequest {
            lookup: None,
            commands: vec![
                EngineCommand::SetGlobal {
                    identifier: "threshold".to_string(),
                    value: Value::Int(9),
                },
                EngineCommand::GetGlobal {
                    identifier: "threshold".to_string(),
                    out_identifier: Some("out".to_string()),
                },
            ],
        };
        let results = engine.execute("c1", request).await.unwrap();
        assert_eq!(results.value("out"), Some(&Value::Int(9)));

        // A second request starts from a clean slate.
        let request = ExecutionRequest {
            lookup: None,
            commands: vec![EngineCommand::GetGlobal {
                identifier: "threshold".to_string(),
                out_identifier: None,
            }],
        };
        let results = engine.execute("c1", request).await.unwrap();
        assert_eq!(results.value("threshold"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn fire_all_rules_reports_insert_count_bounded_by_max() {
        let engine = NullEngine;
        let insert = |id: &str| EngineCommand::Insert {
            out_identifier: Some(id.to_string()),
            value: Value::Null,
            return_object: false,
        };
        let request = ExecutionRequest {
            lookup: None,
            commands: vec![
                insert("x"),
                insert("y"),
                insert("z"),
                EngineCommand::FireAllRules {
                    out_identifier: Some("fired".to_string()),
                    max: Some(2),
                },
            ],
        };

        let results = engine.execute("c1", request).await.unwrap();
        assert_eq!(results.value("fired"), Some(&Value::Int(2)));
    }

    #[tokio::test]
    async fn query_echoes_arguments() {
        let engine = NullEngine;
        let request = ExecutionRequest {
            lookup: None,
            commands: vec![EngineCommand::Query {
                name: "open-orders".to_string(),
                out_identifier: "orders".to_string(),
                args: vec![Value::Int(1), Value::from("open")],
            }],
        };

        let results = engine.execute("c1", request).await.unwrap();
        assert_eq!(
            results.value("orders"),
            Some(&Value::Array(vec![Value::Int(1), Value::from("open")]))
        );
    }
}
