//! mcp-probe — protocol test client for MCP servers speaking JSON-RPC 2.0 over stdio.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod process;
pub mod script;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{ClientOptions, IdCorrelation, McpClient};
pub use config::ProbeConfig;
pub use process::ServerProcess;
pub use session::ProbeSession;
pub use transport::StdioTransport;
