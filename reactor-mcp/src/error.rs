//! Error taxonomy for MCP operations.

use thiserror::Error;

/// Errors from connecting to, or calling tools on, a remote MCP server.
#[non_exhaustive]
#[derive(Debug, Error, Clone)]
pub enum McpError {
    /// The transport (stdio child process or HTTP) could not be established.
    #[error("mcp connection failed: {0}")]
    Connection(String),

    /// The MCP initialize handshake failed after a transport connected.
    #[error("mcp initialization failed: {0}")]
    Initialization(String),

    /// A lower-level transport error surfaced by the underlying service.
    #[error("mcp transport error: {0}")]
    Transport(String),

    /// A protocol-level request (e.g. `tools/list`) failed.
    #[error("mcp protocol error: {0}")]
    Protocol(String),
}
