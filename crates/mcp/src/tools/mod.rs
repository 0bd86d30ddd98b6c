pub mod time;
mod registry;

pub use registry::{
    json_schema_integer, json_schema_object, json_schema_string, Tool, ToolRegistry,
};
pub use time::{FormatTimestampTool, GetCurrentTimeTool, GetTimestampTool, DEFAULT_TIMEZONE};

use crate::error::McpResult;

/// Build the registry of time tools this server ships with.
pub fn default_registry() -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(std::sync::Arc::new(GetCurrentTimeTool))?;
    registry.register(std::sync::Arc::new(GetTimestampTool))?;
    registry.register(std::sync::Arc::new(FormatTimestampTool))?;
    Ok(registry)
}
