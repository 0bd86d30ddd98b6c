// MCP (Model Context Protocol) server core
// Transport-agnostic session and dispatch layer plus the built-in time tools

pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;

pub use dispatch::Dispatcher;
pub use error::{McpError, McpResult};
pub use session::{Session, SessionState};
pub use tools::{default_registry, Tool, ToolRegistry};
