//! Error types and JSON-RPC error codes for the probe client.

use std::time::Duration;

use serde_json::Value;

use super::message::{JsonRpcReply, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Human-readable name for a standard code, if it is one.
    pub fn name(code: i32) -> Option<&'static str> {
        match code {
            PARSE_ERROR => Some("parse error"),
            INVALID_REQUEST => Some("invalid request"),
            METHOD_NOT_FOUND => Some("method not found"),
            INVALID_PARAMS => Some("invalid params"),
            INTERNAL_ERROR => Some("internal error"),
            _ => None,
        }
    }
}

/// All errors the probe client can raise.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("Failed to launch server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid server command: {0}")]
    InvalidCommand(String),

    #[error("Server process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("No response to `{method}` within {after:?}")]
    Timeout { method: String, after: Duration },

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: i64, got: RequestId },

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Turn an error envelope into `ProbeError::Rpc`; `None` for anything else.
    pub fn from_response(response: &Value) -> Option<Self> {
        JsonRpcReply::from_value(response)
            .error
            .map(|e| ProbeError::Rpc {
                code: e.code,
                message: e.message,
            })
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response_error_envelope() {
        let resp = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32601, "message": "Method not found"}
        });
        let err = ProbeError::from_response(&resp).unwrap();
        assert_eq!(err.to_string(), "RPC error (-32601): Method not found");
    }

    #[test]
    fn test_from_response_success_is_none() {
        let resp = json!({"jsonrpc": "2.0", "id": 2, "result": {}});
        assert!(ProbeError::from_response(&resp).is_none());
        assert!(ProbeError::from_response(&json!({})).is_none());
    }

    #[test]
    fn test_timeout_display() {
        let err = ProbeError::Timeout {
            method: "tools/list".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "No response to `tools/list` within 30s");

        let err = ProbeError::Timeout {
            method: "ping".into(),
            after: Duration::from_millis(100),
        };
        assert_eq!(err.to_string(), "No response to `ping` within 100ms");
    }

    #[test]
    fn test_error_code_names() {
        assert_eq!(error_codes::name(-32700), Some("parse error"));
        assert_eq!(error_codes::name(-1), None);
    }
}
