//! Error types for the commerce MCP server

use commerce_core::CommerceError;
use thiserror::Error;

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur in the MCP server
#[derive(Error, Debug)]
pub enum McpError {
    /// Tool arguments failed validation
    #[error("Invalid arguments: {0}")]
    InvalidParams(String),

    /// Tool is not offered by this service
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// JSON-RPC method is not supported
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Cart session does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Commerce core error
    #[error(transparent)]
    Core(#[from] CommerceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Create an MCP-formatted error body
    pub fn to_mcp_error(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string()
            }
        });
        if let McpError::Core(core) = self {
            body["error"]["kind"] = serde_json::json!(core.error_code());
        }
        body
    }

    /// Get error code for the JSON-RPC layer
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::SessionNotFound(_) => -32001,
            McpError::Core(CommerceError::ProductNotFound { .. }) => -32002,
            McpError::InvalidParams(_) => -32602,
            McpError::UnknownTool(_) => -32601,
            McpError::MethodNotFound(_) => -32601,
            McpError::Core(CommerceError::InvalidConfig { .. }) => -32602,
            McpError::Serialization(_) => -32700,
            _ => -32603,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::InvalidParams("x".into()).error_code(), -32602);
        assert_eq!(McpError::MethodNotFound("x".into()).error_code(), -32601);
        assert_eq!(McpError::Internal("x".into()).error_code(), -32603);
        assert_eq!(
            McpError::from(CommerceError::ProductNotFound {
                product_id: "th-404".into(),
                retailer: "TechHub".into(),
            })
            .error_code(),
            -32002
        );
    }

    #[test]
    fn test_mcp_error_body() {
        let err = McpError::from(CommerceError::CartLocked);
        let body = err.to_mcp_error();

        assert_eq!(body["error"]["code"], -32603);
        assert_eq!(body["error"]["kind"], "CART_LOCKED");
        assert!(body["error"]["message"].as_str().unwrap().contains("lock"));
    }
}
