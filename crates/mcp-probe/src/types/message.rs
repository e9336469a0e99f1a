//! JSON-RPC 2.0 message types for the MCP protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Unique request identifier — can be string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// An outgoing JSON-RPC 2.0 request.
///
/// Field order matches the wire layout `jsonrpc, method, params, id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Build a request. `None` params become an empty object.
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: params.unwrap_or_else(empty_object),
            id: RequestId::Number(id),
        }
    }
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A server reply as seen by the client: either `result` or `error` is set.
///
/// Every field is optional so that loosely conforming servers still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonRpcReply {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcReply {
    /// Decode a reply from a raw response document. Non-object values and
    /// the empty end-of-stream mapping decode to an empty reply.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.result.is_none() && self.error.is_none()
    }
}

/// `{}` — used for default params and for the end-of-stream response.
pub fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_layout() {
        let req = JsonRpcRequest::new(3, "tools/call", Some(json!({"name": "navigate"})));
        let text = serde_json::to_string(&req).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"navigate"},"id":3}"#
        );
    }

    #[test]
    fn test_request_defaults_params_to_empty_object() {
        let req = JsonRpcRequest::new(1, "tools/list", None);
        assert_eq!(req.params, json!({}));
    }

    #[test]
    fn test_notification_omits_missing_params() {
        let n = JsonRpcNotification::new("notifications/initialized", None);
        let text = serde_json::to_string(&n).unwrap();
        assert_eq!(text, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
    }

    #[test]
    fn test_reply_decodes_error() {
        let value = json!({
            "jsonrpc": "2.0",
            "id": 4,
            "error": {"code": -32601, "message": "Method not found"}
        });
        let reply = JsonRpcReply::from_value(&value);
        assert_eq!(reply.id, Some(RequestId::Number(4)));
        assert!(reply.result.is_none());
        assert_eq!(reply.error.unwrap().code, -32601);
    }

    #[test]
    fn test_reply_from_empty_mapping_is_empty() {
        assert!(JsonRpcReply::from_value(&empty_object()).is_empty());
        assert!(JsonRpcReply::from_value(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::Number(7).to_string(), "7");
        assert_eq!(RequestId::String("a".into()).to_string(), "a");
        assert_eq!(RequestId::Null.to_string(), "null");
    }
}
