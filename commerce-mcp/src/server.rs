//! MCP server protocol implementation
//!
//! Newline-delimited JSON-RPC 2.0 over any async reader/writer pair; the
//! binary wires it to stdio.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use commerce_core::{CommerceConfig, Retailer};

use crate::error::{McpError, McpResult};
use crate::session::SessionManager;
use crate::tools::{CartTools, CatalogTools, ToolCall, ToolDefinition, ToolResult};
use crate::{PROTOCOL_VERSION, SERVER_VERSION};

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct MCPRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl MCPRequest {
    /// Notifications carry no id and get no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

#[derive(Debug, Serialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
}

impl MCPResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError { code, message }),
        }
    }
}

/// Which service a server process exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Cart,
    Catalog(Retailer),
}

impl Service {
    /// Server name reported on `initialize`
    pub fn server_name(self) -> String {
        match self {
            Service::Cart => "cart-mcp".to_string(),
            Service::Catalog(retailer) => format!("{}-mcp", retailer.name().to_lowercase()),
        }
    }

    fn instructions(self) -> String {
        match self {
            Service::Cart => "Shopping cart with a spending budget. Trust is derived from product ids \
                and retailers; checkout of untrusted items needs the user's confirmation."
                .to_string(),
            Service::Catalog(retailer) => format!(
                "{}. Products carry trust_level='{}'.",
                retailer.description(),
                retailer.trust_level()
            ),
        }
    }
}

enum Backend {
    Cart(CartTools),
    Catalog(CatalogTools),
}

/// MCP server for one commerce service
pub struct CommerceServer {
    service: Service,
    backend: Backend,
}

impl CommerceServer {
    /// Build the server for `service`; the cart service opens its session here
    pub fn new(service: Service, config: CommerceConfig) -> McpResult<Self> {
        let backend = match service {
            Service::Cart => {
                let sessions = Arc::new(SessionManager::new(config));
                Backend::Cart(CartTools::new(sessions)?)
            }
            Service::Catalog(retailer) => Backend::Catalog(CatalogTools::for_retailer(retailer)?),
        };
        Ok(Self { service, backend })
    }

    pub fn cart(config: CommerceConfig) -> McpResult<Self> {
        Self::new(Service::Cart, config)
    }

    pub fn catalog(retailer: Retailer) -> McpResult<Self> {
        Self::new(Service::Catalog(retailer), CommerceConfig::default())
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        match &self.backend {
            Backend::Cart(tools) => tools.definitions(),
            Backend::Catalog(tools) => tools.definitions(),
        }
    }

    /// Run a tool; failures come back as `isError` results
    pub fn handle_tool_call(&self, call: ToolCall) -> ToolResult {
        let result = match &self.backend {
            Backend::Cart(tools) => tools.call(&call.name, call.arguments),
            Backend::Catalog(tools) => tools.call(&call.name, call.arguments),
        };

        match result {
            Ok(value) => ToolResult::json(&value),
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::error(&e)
            }
        }
    }

    /// Handle an MCP request; `None` for notifications
    pub fn handle_request(&self, request: MCPRequest) -> Option<MCPResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params),
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => MCPResponse::success(request.id, value),
            Err(e) => MCPResponse::failure(request.id, e.error_code(), e.to_string()),
        })
    }

    fn handle_initialize(&self) -> Value {
        tracing::info!(service = %self.service.server_name(), "Client initialized");
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.service.server_name(),
                "version": SERVER_VERSION
            },
            "capabilities": {
                "tools": {}
            },
            "instructions": self.service.instructions()
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.tools() })
    }

    fn handle_tools_call(&self, params: Value) -> McpResult<Value> {
        let call: ToolCall = serde_json::from_value(params)
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        if !self.tools().iter().any(|t| t.name == call.name) {
            return Err(McpError::UnknownTool(call.name));
        }

        let result = self.handle_tool_call(call);
        Ok(serde_json::to_value(result)?)
    }

    /// Serve newline-delimited requests until the reader is exhausted
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<MCPRequest>(&line) {
                Ok(request) => self.handle_request(request),
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable request");
                    Some(MCPResponse::failure(None, -32700, format!("Parse error: {}", e)))
                }
            };

            if let Some(response) = response {
                let mut bytes = serde_json::to_vec(&response)?;
                bytes.push(b'\n');
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Run the MCP server over stdio
    pub async fn run_stdio(&self) -> McpResult<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}
