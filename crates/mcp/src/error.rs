//! Error types for the utility MCP server core.

/// Result type for core operations.
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur while registering or dispatching tools.
///
/// Everything here is request-scoped: the dispatcher converts these into
/// error results for the caller, and the owning session stays alive.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Call referenced a tool name that was never registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool was registered twice under the same name.
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    /// Arguments did not match the tool's input schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Handler-signaled semantic error (unknown timezone, timestamp out of
    /// range, ...). Becomes an error result, never a fault.
    #[error("{0}")]
    Tool(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Create a semantic tool error from any displayable value.
    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool(message.into())
    }
}
