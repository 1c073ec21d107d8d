#![deny(missing_docs)]
//! MCP client and server bridging MCP tools with neuron ToolRegistry.
//!
//! Two independent components:
//!
//! - [`McpClient`] connects to an MCP server, discovers its tools, and wraps
//!   each as a [`ToolDyn`](reactor_tool::ToolDyn) for use in a
//!   [`ToolRegistry`](reactor_tool::ToolRegistry).
//! - [`McpServer`] wraps a [`ToolRegistry`](reactor_tool::ToolRegistry) and
//!   exposes its tools via the MCP protocol over stdio.

pub mod client;
pub mod connection;
pub mod error;
pub mod server;
pub mod types;

pub use client::McpClient;
pub use connection::{ConnectionHealth, ManagedMcpClient, ReconnectPolicy};
pub use error::McpError;
pub use server::McpServer;
pub use types::*;
