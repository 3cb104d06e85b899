use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::application::ports::{LabResultRepository, SymptomRepository, WearableRepository};
use crate::domain::UserId;

use super::definitions::{health_tool_definitions, ParameterKind, ToolDefinition};
use super::{correlation, labs, summary, symptoms, wearables};

/// Executes a tool by name. Implementations must never fail: every problem
/// becomes a structured `{"error": ...}` result string so the chat loop can
/// continue.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: &Value) -> String;
}

/// Routes model-requested tool calls to the read-only health queries. Bound
/// to one owner at construction; every query is scoped to that owner no
/// matter what the model's arguments contain.
pub struct ToolDispatcher {
    labs: Arc<dyn LabResultRepository>,
    symptoms: Arc<dyn SymptomRepository>,
    wearables: Arc<dyn WearableRepository>,
    definitions: Vec<ToolDefinition>,
    user_id: UserId,
}

impl ToolDispatcher {
    pub fn new(
        labs: Arc<dyn LabResultRepository>,
        symptoms: Arc<dyn SymptomRepository>,
        wearables: Arc<dyn WearableRepository>,
        user_id: UserId,
    ) -> Self {
        Self {
            labs,
            symptoms,
            wearables,
            definitions: health_tool_definitions(),
            user_id,
        }
    }

    async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, crate::application::ports::RepositoryError> {
        match name {
            "get_recent_labs" => {
                labs::recent_labs(
                    self.labs.as_ref(),
                    self.user_id,
                    arg_i64(args, "days").unwrap_or(90),
                    arg_str(args, "test_name"),
                )
                .await
            }
            "get_lab_trend" => {
                labs::lab_trend(
                    self.labs.as_ref(),
                    self.user_id,
                    arg_str(args, "test_name").unwrap_or_default(),
                    arg_i64(args, "months").unwrap_or(12),
                )
                .await
            }
            "get_symptom_timeline" => {
                symptoms::symptom_timeline(
                    self.symptoms.as_ref(),
                    self.user_id,
                    arg_str(args, "symptom_type"),
                    arg_i64(args, "days").unwrap_or(30),
                )
                .await
            }
            "get_wearable_summary" => {
                wearables::wearable_summary(
                    self.wearables.as_ref(),
                    self.user_id,
                    arg_str(args, "metric").unwrap_or_default(),
                    arg_i64(args, "days").unwrap_or(30),
                )
                .await
            }
            "get_daily_summary" => {
                summary::daily_summary(
                    self.labs.as_ref(),
                    self.symptoms.as_ref(),
                    self.wearables.as_ref(),
                    self.user_id,
                    arg_str(args, "date").unwrap_or_default(),
                )
                .await
            }
            "correlate_metrics" => {
                correlation::correlate_metrics(
                    self.labs.as_ref(),
                    self.symptoms.as_ref(),
                    self.wearables.as_ref(),
                    self.user_id,
                    arg_str(args, "metric_a").unwrap_or_default(),
                    arg_str(args, "metric_b").unwrap_or_default(),
                    arg_i64(args, "days").unwrap_or(90),
                )
                .await
            }
            // Unreachable: execute() rejects undeclared names first.
            other => Ok(json!({ "error": format!("Unknown tool: {}", other) })),
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolDispatcher {
    async fn execute(&self, name: &str, arguments: &Value) -> String {
        tracing::info!(tool = name, "Executing health tool");

        let Some(definition) = self.definitions.iter().find(|d| d.name == name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return json!({ "error": format!("Unknown tool: {}", name) }).to_string();
        };

        let args = match validate_arguments(definition, arguments) {
            Ok(args) => args,
            Err(message) => {
                tracing::warn!(tool = name, error = %message, "Tool argument validation failed");
                return json!({ "error": message }).to_string();
            }
        };

        match self.dispatch(name, &args).await {
            Ok(result) => result.to_string(),
            Err(e) => {
                tracing::error!(tool = name, error = %e, "Tool execution failed");
                json!({ "error": format!("Tool execution failed: {}", e) }).to_string()
            }
        }
    }
}

/// Interpret loosely-typed model arguments against the declared schema.
/// Undeclared keys are dropped; required parameters must be present;
/// integers accept numbers or numeric strings.
fn validate_arguments(
    definition: &ToolDefinition,
    arguments: &Value,
) -> Result<Map<String, Value>, String> {
    let supplied = arguments.as_object().cloned().unwrap_or_default();
    let mut validated = Map::new();

    for param in &definition.parameters {
        match supplied.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, definition.name
                    ));
                }
            }
            Some(value) => {
                let coerced = match param.kind {
                    ParameterKind::Integer => coerce_integer(value),
                    ParameterKind::String => coerce_string(value),
                };
                match coerced {
                    Some(v) => {
                        validated.insert(param.name.clone(), v);
                    }
                    None => {
                        return Err(format!(
                            "Invalid value for parameter '{}' of tool '{}'",
                            param.name, definition.name
                        ));
                    }
                }
            }
        }
    }

    Ok(validated)
}

fn coerce_integer(value: &Value) -> Option<Value> {
    if let Some(i) = value.as_i64() {
        return Some(json!(i));
    }
    if let Some(f) = value.as_f64() {
        if f.fract() == 0.0 {
            return Some(json!(f as i64));
        }
    }
    value
        .as_str()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(|i| json!(i))
}

fn coerce_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => Some(json!(s)),
        Value::Number(n) => Some(json!(n.to_string())),
        _ => None,
    }
}

fn arg_i64(args: &Map<String, Value>, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}

fn arg_str<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}
