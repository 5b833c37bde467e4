//! JSON-RPC 2.0 envelope types and A2A method names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The only supported JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request ID: string, number, or null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    String(String),
    Number(i64),
    Null,
}

impl JsonRpcId {
    /// Read an ID from a raw request value, falling back to null for
    /// anything that is not a string or integer
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => JsonRpcId::String(s.clone()),
            Some(Value::Number(n)) => n.as_i64().map_or(JsonRpcId::Null, JsonRpcId::Number),
            _ => JsonRpcId::Null,
        }
    }
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonRpcId::String(s) => write!(f, "{}", s),
            JsonRpcId::Number(n) => write!(f, "{}", n),
            JsonRpcId::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Optional structured error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response; exactly one of `result` or `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    pub id: JsonRpcId,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: JsonRpcId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: JsonRpcId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// A2A methods recognised by the JSON-RPC endpoint.
///
/// Both the slash form (`message/send`) and the colon form used by the REST
/// binding (`message:send`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcMethod {
    SendMessage,
    GetTask,
    CancelTask,
    /// Streaming and push-notification methods this agent does not serve
    Unsupported(String),
}

impl RpcMethod {
    /// Resolve a method name, or `None` if it is unknown
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "message/send" | "message:send" => Some(RpcMethod::SendMessage),
            "tasks/get" | "tasks:get" => Some(RpcMethod::GetTask),
            "tasks/cancel" | "tasks:cancel" => Some(RpcMethod::CancelTask),
            "message/stream" | "message:stream" | "tasks/resubscribe" | "tasks:resubscribe"
            | "tasks/subscribe" | "tasks:subscribe" => {
                Some(RpcMethod::Unsupported(name.to_string()))
            }
            other if other.starts_with("tasks/pushNotificationConfig/") => {
                Some(RpcMethod::Unsupported(name.to_string()))
            }
            _ => None,
        }
    }
}
