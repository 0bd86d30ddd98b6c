// Process edge for the utility MCP server: configuration and the SSE
// transport. The binary in main.rs wires these to the CLI.

pub mod config;
pub mod sse;
