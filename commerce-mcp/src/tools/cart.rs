//! Cart service tools
//!
//! `add_item`, `remove_item`, `get_cart`, `set_budget`, `clear_cart` and
//! `process_payment`, all operating on one session's cart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use commerce_core::config::validate_budget;
use commerce_core::{
    AddItem, Cart, ConfirmationMode, LineItem, PaymentResult, TrustLevel, TrustStatus,
};

use super::{parse_args, to_value, ToolDefinition};
use crate::error::{McpError, McpResult};
use crate::session::SessionManager;

pub const ADD_ITEM: &str = "add_item";
pub const REMOVE_ITEM: &str = "remove_item";
pub const GET_CART: &str = "get_cart";
pub const SET_BUDGET: &str = "set_budget";
pub const CLEAR_CART: &str = "clear_cart";
pub const PROCESS_PAYMENT: &str = "process_payment";

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemInput {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub retailer: String,

    /// Caller's claim; recorded in logs, never trusted
    #[serde(default)]
    pub trust_level: Option<TrustLevel>,
}

impl AddItemInput {
    fn validate(&self) -> McpResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(McpError::InvalidParams("product_id must not be empty".to_string()));
        }
        if self.retailer.trim().is_empty() {
            return Err(McpError::InvalidParams("retailer must not be empty".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(McpError::InvalidParams(format!(
                "price must be a non-negative amount, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

impl From<AddItemInput> for AddItem {
    fn from(input: AddItemInput) -> Self {
        let request = AddItem::new(input.product_id, input.name, input.price, input.retailer);
        match input.trust_level {
            Some(hint) => request.with_trust_hint(hint),
            None => request,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    pub total: f64,
    pub item_count: usize,
    pub trust_status: TrustStatus,
    pub has_untrusted_items: bool,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self {
            total: cart.total,
            item_count: cart.item_count(),
            trust_status: cart.trust_status,
            has_untrusted_items: cart.has_untrusted_items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddItemOutput {
    pub success: bool,
    pub message: String,
    pub item: LineItem,
    pub cart_summary: CartSummary,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemInput {
    pub cart_item_id: u64,
}

#[derive(Debug, Serialize)]
pub struct RemoveItemOutput {
    pub success: bool,
    pub message: String,
    pub cart: Cart,
}

#[derive(Debug, Serialize)]
pub struct GetCartOutput {
    pub cart: Cart,
    pub security_note: String,
}

#[derive(Debug, Deserialize)]
pub struct SetBudgetInput {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct SetBudgetOutput {
    pub success: bool,
    pub message: String,
    pub budget: f64,
    pub current_total: f64,
    pub remaining: f64,
}

#[derive(Debug, Serialize)]
pub struct ClearCartOutput {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessPaymentInput {
    #[serde(default)]
    pub user_confirmed: bool,
}

/// Tool definitions for the cart service
pub fn definitions(mode: ConfirmationMode) -> Vec<ToolDefinition> {
    let payment_description = match mode {
        ConfirmationMode::Handshake => {
            "Process checkout payment. Fails if the cart is over budget. If the cart contains \
             items from untrusted retailers, the first call asks for confirmation; call again \
             with user_confirmed=true once the user has agreed."
        }
        ConfirmationMode::Strict => {
            "Process checkout payment. Fails if the cart is over budget. Payment is BLOCKED \
             if the cart contains items from untrusted retailers."
        }
    };

    vec![
        ToolDefinition::new(
            ADD_ITEM,
            "Add an item to the shopping cart. Trust level is derived from the product id and retailer.",
            json!({
                "type": "object",
                "properties": {
                    "product_id": { "type": "string", "description": "Product ID" },
                    "name": { "type": "string", "description": "Product name" },
                    "price": { "type": "number", "minimum": 0, "description": "Product price" },
                    "retailer": { "type": "string", "description": "Retailer name" },
                    "trust_level": {
                        "type": "string",
                        "enum": ["trusted", "untrusted"],
                        "description": "Retailer trust level as reported by the catalog (informational)"
                    }
                },
                "required": ["product_id", "name", "price", "retailer"]
            }),
        ),
        ToolDefinition::new(
            REMOVE_ITEM,
            "Remove an item from the cart by cart_item_id",
            json!({
                "type": "object",
                "properties": {
                    "cart_item_id": { "type": "integer", "minimum": 1, "description": "Cart item ID to remove" }
                },
                "required": ["cart_item_id"]
            }),
        ),
        ToolDefinition::new(
            GET_CART,
            "Get current cart contents including total, budget, and trust status",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolDefinition::new(
            SET_BUDGET,
            "Set the shopping budget limit",
            json!({
                "type": "object",
                "properties": {
                    "amount": { "type": "number", "minimum": 0, "description": "Budget amount" }
                },
                "required": ["amount"]
            }),
        ),
        ToolDefinition::new(
            CLEAR_CART,
            "Remove all items from cart",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolDefinition::new(
            PROCESS_PAYMENT,
            payment_description,
            json!({
                "type": "object",
                "properties": {
                    "user_confirmed": {
                        "type": "boolean",
                        "default": false,
                        "description": "Set after the user explicitly approved buying from untrusted retailers"
                    }
                }
            }),
        ),
    ]
}

/// Cart tools bound to one session
pub struct CartTools {
    sessions: Arc<SessionManager>,
    session_id: String,
}

impl CartTools {
    /// Open a fresh session for this tool set
    pub fn new(sessions: Arc<SessionManager>) -> McpResult<Self> {
        let session_id = sessions.open_session()?;
        Ok(Self { sessions, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        definitions(self.sessions.policy().mode())
    }

    /// Dispatch a call by tool name
    pub fn call(&self, name: &str, arguments: Value) -> McpResult<Value> {
        match name {
            ADD_ITEM => to_value(self.add_item(parse_args(arguments)?)?),
            REMOVE_ITEM => to_value(self.remove_item(parse_args(arguments)?)?),
            GET_CART => to_value(self.get_cart()?),
            SET_BUDGET => to_value(self.set_budget(parse_args(arguments)?)?),
            CLEAR_CART => to_value(self.clear_cart()?),
            PROCESS_PAYMENT => to_value(self.process_payment(parse_args(arguments)?)?),
            other => Err(McpError::UnknownTool(other.to_string())),
        }
    }

    pub fn add_item(&self, input: AddItemInput) -> McpResult<AddItemOutput> {
        input.validate()?;
        let message = format!("Added {} to cart", input.name);

        self.sessions.with_cart(&self.session_id, |cart, _| {
            let item = cart.add(input.into());
            let snapshot = cart.snapshot();
            AddItemOutput {
                success: true,
                message,
                item,
                cart_summary: CartSummary::from(&snapshot),
            }
        })
    }

    pub fn remove_item(&self, input: RemoveItemInput) -> McpResult<RemoveItemOutput> {
        self.sessions.with_cart(&self.session_id, |cart, _| {
            let removed = cart.remove(input.cart_item_id);
            RemoveItemOutput {
                success: removed,
                message: if removed { "Item removed" } else { "Item not found" }.to_string(),
                cart: cart.snapshot(),
            }
        })
    }

    pub fn get_cart(&self) -> McpResult<GetCartOutput> {
        self.sessions.with_cart(&self.session_id, |cart, policy| {
            let cart = cart.snapshot();
            let security_note = security_note(&cart, policy.mode());
            GetCartOutput { cart, security_note }
        })
    }

    pub fn set_budget(&self, input: SetBudgetInput) -> McpResult<SetBudgetOutput> {
        validate_budget(input.amount).map_err(McpError::InvalidParams)?;

        self.sessions.with_cart(&self.session_id, |cart, _| {
            cart.set_budget(input.amount);
            let snapshot = cart.snapshot();
            SetBudgetOutput {
                success: true,
                message: format!("Budget set to ${}", input.amount),
                budget: snapshot.budget,
                current_total: snapshot.total,
                remaining: snapshot.remaining(),
            }
        })
    }

    pub fn clear_cart(&self) -> McpResult<ClearCartOutput> {
        self.sessions.with_cart(&self.session_id, |cart, _| cart.clear())?;
        Ok(ClearCartOutput {
            success: true,
            message: "Cart cleared".to_string(),
        })
    }

    pub fn process_payment(&self, input: ProcessPaymentInput) -> McpResult<PaymentResult> {
        let decision = self.sessions.with_cart(&self.session_id, |cart, policy| {
            policy.checkout(cart, input.user_confirmed)
        })?;
        Ok(decision.to_payment_result())
    }
}

fn security_note(cart: &Cart, mode: ConfirmationMode) -> String {
    if !cart.has_untrusted_items {
        return "Cart is secure for checkout.".to_string();
    }
    let retailers = cart.untrusted_retailers().join(", ");
    match mode {
        ConfirmationMode::Handshake => format!(
            "Cart contains items from untrusted retailers ({}). Checkout will require user confirmation.",
            retailers
        ),
        ConfirmationMode::Strict => format!(
            "Cart contains items from untrusted retailers ({}). Checkout will be blocked.",
            retailers
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_core::CommerceConfig;

    fn tools() -> CartTools {
        CartTools::new(Arc::new(SessionManager::default())).unwrap()
    }

    fn add(tools: &CartTools, id: &str, price: f64, retailer: &str) -> AddItemOutput {
        tools
            .add_item(AddItemInput {
                product_id: id.to_string(),
                name: format!("Product {}", id),
                price,
                retailer: retailer.to_string(),
                trust_level: None,
            })
            .unwrap()
    }

    #[test]
    fn test_add_item_summary() {
        let tools = tools();
        let out = add(&tools, "th-001", 1599.0, "TechHub");
        assert_eq!(out.message, "Added Product th-001 to cart");
        assert_eq!(out.item.cart_item_id, 1);
        assert_eq!(out.cart_summary.total, 1599.0);
        assert_eq!(out.cart_summary.trust_status, TrustStatus::AllTrusted);

        let out = add(&tools, "iot-001", 89.0, "IoTMarket");
        assert_eq!(out.cart_summary.item_count, 2);
        assert!(out.cart_summary.has_untrusted_items);
    }

    #[test]
    fn test_add_item_rejects_bad_price() {
        let tools = tools();
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let result = tools.add_item(AddItemInput {
                product_id: "th-001".into(),
                name: "x".into(),
                price,
                retailer: "TechHub".into(),
                trust_level: None,
            });
            assert!(matches!(result, Err(McpError::InvalidParams(_))));
        }
        assert_eq!(tools.get_cart().unwrap().cart.items.len(), 0);
    }

    #[test]
    fn test_remove_item_messages() {
        let tools = tools();
        let id = add(&tools, "th-007", 99.0, "TechHub").item.cart_item_id;

        let first = tools.remove_item(RemoveItemInput { cart_item_id: id }).unwrap();
        assert!(first.success);
        assert_eq!(first.message, "Item removed");

        let second = tools.remove_item(RemoveItemInput { cart_item_id: id }).unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "Item not found");
    }

    #[test]
    fn test_security_note_follows_mode() {
        let tools = tools();
        assert_eq!(tools.get_cart().unwrap().security_note, "Cart is secure for checkout.");

        add(&tools, "iot-002", 27.0, "IoTMarket");
        let note = tools.get_cart().unwrap().security_note;
        assert!(note.contains("IoTMarket"));
        assert!(note.contains("confirmation"));

        let config = CommerceConfig::builder()
            .confirmation_mode(ConfirmationMode::Strict)
            .build()
            .unwrap();
        let strict = CartTools::new(Arc::new(SessionManager::new(config))).unwrap();
        add(&strict, "iot-002", 27.0, "IoTMarket");
        assert!(strict.get_cart().unwrap().security_note.contains("blocked"));
    }

    #[test]
    fn test_set_budget_reports_remaining() {
        let tools = tools();
        add(&tools, "gz-005", 249.0, "GadgetZone");

        let out = tools.set_budget(SetBudgetInput { amount: 500.0 }).unwrap();
        assert_eq!(out.message, "Budget set to $500");
        assert_eq!(out.budget, 500.0);
        assert_eq!(out.current_total, 249.0);
        assert_eq!(out.remaining, 251.0);

        assert!(tools.set_budget(SetBudgetInput { amount: -10.0 }).is_err());
        assert_eq!(tools.get_cart().unwrap().cart.budget, 500.0);
    }

    #[test]
    fn test_process_payment_handshake() {
        let tools = tools();
        add(&tools, "iot-500", 500.0, "IoTMarket");

        let first = tools.process_payment(ProcessPaymentInput::default()).unwrap();
        assert!(!first.success);
        assert_eq!(first.requires_confirmation, Some(true));
        assert_eq!(first.receipt_id, "");

        let second = tools
            .process_payment(ProcessPaymentInput { user_confirmed: true })
            .unwrap();
        assert!(second.success);
        assert!(second.receipt_id.starts_with("RCP-"));
        assert!(tools.get_cart().unwrap().cart.items.is_empty());
    }

    #[test]
    fn test_call_dispatch() {
        let tools = tools();
        let value = tools.call(GET_CART, Value::Null).unwrap();
        assert_eq!(value["cart"]["trust_status"], "empty");

        let err = tools.call("checkout_now", Value::Null).unwrap_err();
        assert!(matches!(err, McpError::UnknownTool(_)));

        let err = tools.call(REMOVE_ITEM, json!({})).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let names: Vec<String> = tools().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![ADD_ITEM, REMOVE_ITEM, GET_CART, SET_BUDGET, CLEAR_CART, PROCESS_PAYMENT]
        );
    }
}
