//! JSON-RPC-mapped error taxonomy for the router core: a single
//! `thiserror` enum tagged by JSON-RPC 2.0 error code, one variant per
//! error class.

use serde::Serialize;
use serde_json::Value;

pub const ERROR_CODE_INVALID_REQUEST: i64 = -32600;
pub const ERROR_CODE_METHOD_NOT_FOUND: i64 = -32601;
pub const ERROR_CODE_INVALID_PARAMS: i64 = -32602;
pub const ERROR_CODE_INTERNAL_ERROR: i64 = -32603;
pub const ERROR_CODE_SERVER_ERROR: i64 = -32000;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("{message}")]
    Configuration { message: String, data: Option<Value> },

    #[error("{message}")]
    Validation { message: String, data: Option<Value> },

    #[error("{message}")]
    ToolNotFound { message: String, data: Option<Value> },

    #[error("{message}")]
    Embedding { message: String, data: Option<Value> },

    #[error("{message}")]
    Upstream { message: String, data: Option<Value> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RouterError::Configuration { message: message.into(), data: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RouterError::Validation { message: message.into(), data: None }
    }

    pub fn validation_with_data(message: impl Into<String>, data: Value) -> Self {
        RouterError::Validation { message: message.into(), data: Some(data) }
    }

    pub fn tool_not_found(message: impl Into<String>) -> Self {
        RouterError::ToolNotFound { message: message.into(), data: None }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        RouterError::Embedding { message: message.into(), data: None }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        RouterError::Upstream { message: message.into(), data: None }
    }

    pub fn upstream_with_data(message: impl Into<String>, data: Value) -> Self {
        RouterError::Upstream { message: message.into(), data: Some(data) }
    }

    /// JSON-RPC 2.0 error code for this error class.
    pub fn code(&self) -> i64 {
        match self {
            RouterError::Configuration { .. } => ERROR_CODE_INVALID_REQUEST,
            RouterError::Validation { .. } => ERROR_CODE_INVALID_PARAMS,
            RouterError::ToolNotFound { .. } => ERROR_CODE_METHOD_NOT_FOUND,
            RouterError::Embedding { .. } => ERROR_CODE_INTERNAL_ERROR,
            RouterError::Upstream { .. } => ERROR_CODE_SERVER_ERROR,
            RouterError::Io(_) | RouterError::Json(_) => ERROR_CODE_INTERNAL_ERROR,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            RouterError::Configuration { data, .. }
            | RouterError::Validation { data, .. }
            | RouterError::ToolNotFound { data, .. }
            | RouterError::Embedding { data, .. }
            | RouterError::Upstream { data, .. } => data.clone(),
            RouterError::Io(_) | RouterError::Json(_) => None,
        }
    }

    /// Build the JSON-RPC 2.0 error response object for this error.
    pub fn into_response(self, id: Value) -> JsonRpcErrorResponse {
        let code = self.code();
        let data = self.data();
        JsonRpcErrorResponse {
            jsonrpc: "2.0",
            id,
            error: JsonRpcError { code, message: self.to_string(), data },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: JsonRpcError,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_each_variant_to_its_json_rpc_code() {
        assert_eq!(RouterError::configuration("x").code(), ERROR_CODE_INVALID_REQUEST);
        assert_eq!(RouterError::validation("x").code(), ERROR_CODE_INVALID_PARAMS);
        assert_eq!(RouterError::tool_not_found("x").code(), ERROR_CODE_METHOD_NOT_FOUND);
        assert_eq!(RouterError::embedding("x").code(), ERROR_CODE_INTERNAL_ERROR);
        assert_eq!(RouterError::upstream("x").code(), ERROR_CODE_SERVER_ERROR);
    }

    #[test]
    fn response_echoes_id_and_carries_data() {
        let err = RouterError::validation_with_data("bad query", json!({"query": ""}));
        let resp = err.into_response(json!(7));
        assert_eq!(resp.id, json!(7));
        assert_eq!(resp.error.code, ERROR_CODE_INVALID_PARAMS);
        assert_eq!(resp.error.data, Some(json!({"query": ""})));
    }

    #[test]
    fn response_omits_data_when_absent() {
        let resp = RouterError::tool_not_found("nope").into_response(Value::Null);
        let serialized = serde_json::to_value(&resp).unwrap();
        assert!(serialized["error"].get("data").is_none());
    }
}
