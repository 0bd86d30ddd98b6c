// Call dispatch: tool lookup, argument validation, fault containment

use crate::error::McpError;
use crate::protocol::{CallToolParams, CallToolResult};
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Routes tool calls to registered handlers and converts every outcome
/// (success, validation failure, semantic error, panic) into a
/// `CallToolResult`. One bad call must never take the session down.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, params: CallToolParams) -> CallToolResult {
        let Some(tool) = self.registry.get(&params.name) else {
            return CallToolResult::error(McpError::UnknownTool(params.name).to_string());
        };

        let arguments = match params.arguments {
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };

        if let Err(reason) = validate_arguments(&tool.schema().input_schema, &arguments) {
            return CallToolResult::error(format!(
                "invalid arguments for tool '{}': {}",
                params.name, reason
            ));
        }

        // Run the handler on its own task so a panicking tool is contained
        // at this boundary instead of unwinding through the session loop.
        let name = params.name;
        let handle = tokio::spawn(async move { tool.execute(arguments).await });
        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::debug!("tool '{}' returned an error: {}", name, err);
                CallToolResult::error(err.to_string())
            }
            Err(join_err) => {
                tracing::error!("tool '{}' aborted: {}", name, join_err);
                CallToolResult::error(format!("tool '{}' failed unexpectedly", name))
            }
        }
    }
}

/// Check `arguments` against a JSON-schema-shaped input schema: required
/// keys must be present, and typed properties must match their declared
/// kind. Anything deeper is the tool's own job.
fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> Result<(), String> {
    let Some(args) = arguments.as_object() else {
        return Err("arguments must be an object".to_string());
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(format!("missing required field '{}'", field));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(expected) = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
        else {
            continue;
        };
        let matches = match expected {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "object" => value.is_object(),
            "array" => value.is_array(),
            _ => true,
        };
        if !matches {
            return Err(format!("field '{}' must be of type {}", key, expected));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpResult;
    use crate::protocol::{ToolContent, ToolSchema};
    use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, Tool};

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "echo a message back".to_string(),
                input_schema: json_schema_object(
                    serde_json::json!({
                        "message": json_schema_string("text to echo"),
                        "repeat": json_schema_integer("repetition count"),
                    }),
                    vec!["message"],
                ),
            }
        }

        async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
            let message = arguments["message"].as_str().unwrap_or_default();
            Ok(CallToolResult::text(message))
        }
    }

    struct PanickingTool;

    #[async_trait::async_trait]
    impl Tool for PanickingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "panic".to_string(),
                description: "always panics".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
            }
        }

        async fn execute(&self, _arguments: serde_json::Value) -> McpResult<CallToolResult> {
            panic!("handler bug");
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry.register(Arc::new(PanickingTool)).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[tokio::test]
    async fn dispatch_runs_registered_tool() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "echo".to_string(),
                arguments: serde_json::json!({"message": "hi"}),
            })
            .await;
        assert_eq!(result.is_error, None);
        assert_eq!(text_of(&result), "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result_not_a_fault() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "does-not-exist".to_string(),
                arguments: serde_json::json!({}),
            })
            .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "unknown tool: does-not-exist");
    }

    #[tokio::test]
    async fn missing_required_field_is_reported_by_name() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "echo".to_string(),
                arguments: serde_json::json!({}),
            })
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("missing required field 'message'"));
    }

    #[tokio::test]
    async fn wrong_argument_kind_is_reported_by_name() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "echo".to_string(),
                arguments: serde_json::json!({"message": "hi", "repeat": "three"}),
            })
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("field 'repeat' must be of type integer"));
    }

    #[tokio::test]
    async fn null_arguments_are_treated_as_empty_object() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "panic".to_string(),
                arguments: serde_json::Value::Null,
            })
            .await;
        // Reached the handler (and was contained); not a validation error.
        assert!(text_of(&result).contains("failed unexpectedly"));
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let result = dispatcher()
            .dispatch(CallToolParams {
                name: "panic".to_string(),
                arguments: serde_json::json!({}),
            })
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("tool 'panic' failed unexpectedly"));
    }
}
