//! MCP request parameter types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Params of a `tools/call` request: always `{name, arguments}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

impl ToolCallParams {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
