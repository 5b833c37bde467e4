//! Error taxonomy
//!
//! Every failure the agent can report maps to one JSON-RPC error code and one
//! HTTP status, so both transports answer with a well-formed envelope.

use axum::http::StatusCode;
use thiserror::Error;

use crate::types::JsonRpcError;

/// Result type for A2A operations
pub type A2aResult<T> = Result<T, A2aError>;

/// JSON-RPC error codes used by the agent
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const COLLABORATOR_ERROR: i32 = -32000;
    pub const TASK_NOT_FOUND: i32 = -32001;
    pub const TASK_NOT_CANCELABLE: i32 = -32002;
    pub const UNSUPPORTED_OPERATION: i32 = -32004;
}

/// Every failure the router or an executor can report
#[derive(Debug, Error)]
pub enum A2aError {
    /// Request body is not valid JSON
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Request is not a valid JSON-RPC 2.0 request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Unknown method or route
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// Parameters missing or malformed
    #[error("Invalid params: {reason}")]
    InvalidParams { reason: String },

    /// Request body over the configured size limit
    #[error("Invalid request: body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Task not found
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Task is in a terminal state and cannot be canceled
    #[error("Task {task_id} cannot be canceled in state {state}")]
    TaskNotCancelable { task_id: String, state: String },

    /// Streaming and push operations are not served
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// A task ran and ended in `failed`
    #[error("{message}")]
    TaskFailed {
        task_id: String,
        context_id: String,
        code: i32,
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl A2aError {
    /// Create a parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method not found error
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create an invalid params error
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::PayloadTooLarge { limit }
    }

    /// Create a task not found error
    pub fn task_not_found(task_id: impl Into<String>) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Create a task not cancelable error
    pub fn task_not_cancelable(task_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self::TaskNotCancelable {
            task_id: task_id.into(),
            state: state.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        match self {
            A2aError::ParseError { .. } => codes::PARSE_ERROR,
            A2aError::InvalidRequest { .. } | A2aError::PayloadTooLarge { .. } => {
                codes::INVALID_REQUEST
            }
            A2aError::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            A2aError::InvalidParams { .. } => codes::INVALID_PARAMS,
            A2aError::TaskNotFound { .. } => codes::TASK_NOT_FOUND,
            A2aError::TaskNotCancelable { .. } => codes::TASK_NOT_CANCELABLE,
            A2aError::UnsupportedOperation { .. } => codes::UNSUPPORTED_OPERATION,
            A2aError::TaskFailed { code, .. } => *code,
            A2aError::SerializationError(_) => codes::INVALID_PARAMS,
            A2aError::InternalError { .. } => codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status used by the REST transport
    pub fn http_status(&self) -> StatusCode {
        match self {
            A2aError::ParseError { .. }
            | A2aError::InvalidRequest { .. }
            | A2aError::InvalidParams { .. }
            | A2aError::SerializationError(_) => StatusCode::BAD_REQUEST,
            A2aError::MethodNotFound { .. } | A2aError::TaskNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            A2aError::TaskNotCancelable { .. } => StatusCode::CONFLICT,
            A2aError::UnsupportedOperation { .. } => StatusCode::NOT_IMPLEMENTED,
            A2aError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            A2aError::TaskFailed { code, .. } => match *code {
                codes::INVALID_PARAMS => StatusCode::BAD_REQUEST,
                codes::COLLABORATOR_ERROR => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            A2aError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{code, message, data?}` body shared by JSON-RPC errors and REST error responses
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured `data` member
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<A2aError> for ErrorResponse {
    fn from(err: A2aError) -> Self {
        let response = ErrorResponse::new(err.code(), err.to_string());
        match err {
            A2aError::TaskFailed {
                task_id,
                context_id,
                ..
            } => response.with_data(serde_json::json!({
                "taskId": task_id,
                "contextId": context_id,
            })),
            _ => response,
        }
    }
}

impl From<ErrorResponse> for JsonRpcError {
    fn from(err: ErrorResponse) -> Self {
        JsonRpcError {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}
