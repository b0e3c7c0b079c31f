//! Commerce MCP Server Library
//!
//! Exposes the commerce core to agents through the Model Context Protocol.
//! One process serves one service: the cart, or a single retailer catalog.
//!
//! ## Architecture
//!
//! ```text
//! Agent (Claude, GPT, etc.)
//!        │  JSON-RPC over stdio
//!        ▼
//! ┌──────────────────────┐
//! │   CommerceServer     │ ◄── This crate
//! │                      │
//! │  ┌────────────────┐  │
//! │  │  Cart tools    │  │ - add_item / remove_item
//! │  │                │  │ - get_cart / set_budget
//! │  │                │  │ - clear_cart / process_payment
//! │  └────────────────┘  │
//! │         or           │
//! │  ┌────────────────┐  │
//! │  │ Catalog tools  │  │ - search_products / get_product
//! │  │                │  │ - compare_products / list_categories
//! │  └────────────────┘  │
//! │                      │
//! │  SessionManager      │ one locked CartStore per session
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │    commerce-core     │
//! │  trust │ cart        │
//! │  checkout │ catalog  │
//! └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use commerce_core::CommerceConfig;
//! use commerce_mcp::CommerceServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = CommerceServer::cart(CommerceConfig::from_env().unwrap()).unwrap();
//!     server.run_stdio().await.unwrap();
//! }
//! ```

pub mod error;
pub mod server;
pub mod session;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::{CommerceServer, MCPRequest, MCPResponse, Service};
pub use session::{CartSession, SessionManager};
pub use tools::{CartTools, CatalogTools, ToolCall, ToolDefinition, ToolResult};

/// MCP protocol revision spoken by the server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
