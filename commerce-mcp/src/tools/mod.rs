//! MCP tool plumbing shared by the cart and catalog services

pub mod cart;
pub mod catalog;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{McpError, McpResult};

pub use cart::CartTools;
pub use catalog::CatalogTools;

/// Tool advertised through `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool call request
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Tool call response
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolResult {
    /// Successful result carrying pretty-printed JSON
    pub fn json(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![ToolContent::text(text)],
            is_error: None,
        }
    }

    /// Failed result; the body is the MCP error object
    pub fn error(err: &McpError) -> Self {
        let body = err.to_mcp_error();
        let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
        Self {
            content: vec![ToolContent::text(text)],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Deserialize tool arguments, treating absent arguments as `{}`
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> McpResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))
}

pub(crate) fn to_value<T: Serialize>(output: T) -> McpResult<Value> {
    Ok(serde_json::to_value(output)?)
}
