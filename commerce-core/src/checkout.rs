//! Checkout policy - decides whether a cart may be paid for
//!
//! Checks run in a fixed order and the first one that fires wins:
//! 1. Empty cart
//! 2. Budget (total strictly above the ceiling), regardless of trust
//! 3. Untrusted items without user confirmation
//! 4. Approve: issue a receipt and clear the cart
//!
//! Confirmation is stateless. A `RequiresConfirmation` decision leaves the
//! cart untouched and nothing is remembered; the caller re-invokes checkout
//! with `user_confirmed = true` and the decision is re-derived from the
//! cart as it is at that moment.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartStore};

/// Receipt prefix used when none is configured
pub const DEFAULT_RECEIPT_PREFIX: &str = "RCP";

/// How untrusted items are handled at checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Untrusted items need a second call with `user_confirmed = true`
    #[default]
    Handshake,
    /// Untrusted items are blocked outright; confirmation is not accepted
    Strict,
}

impl std::str::FromStr for ConfirmationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "handshake" => Ok(ConfirmationMode::Handshake),
            "strict" => Ok(ConfirmationMode::Strict),
            other => Err(format!("unknown confirmation mode: {}", other)),
        }
    }
}

/// Issues opaque receipt identifiers for approved payments
pub trait ReceiptIssuer: Send + Sync {
    fn issue(&self) -> String;
}

/// Receipts of the form `<prefix>-<32 uppercase hex digits of a UUIDv4>`
#[derive(Debug, Clone)]
pub struct UuidReceipts {
    prefix: String,
}

impl UuidReceipts {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for UuidReceipts {
    fn default() -> Self {
        Self::new(DEFAULT_RECEIPT_PREFIX)
    }
}

impl ReceiptIssuer for UuidReceipts {
    fn issue(&self) -> String {
        format!(
            "{}-{}",
            self.prefix,
            Uuid::new_v4().simple().to_string().to_uppercase()
        )
    }
}

/// Outcome of evaluating a cart, before any side effect
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Empty,
    BudgetExceeded { total: f64, budget: f64 },
    RequiresConfirmation { untrusted_retailers: Vec<String> },
    UntrustedBlocked { untrusted_retailers: Vec<String> },
    Approve,
}

/// Outcome of a checkout call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Nothing to pay for
    Empty,

    /// Total is strictly above the budget ceiling
    BudgetExceeded { total: f64, budget: f64 },

    /// Untrusted items present; call again with confirmation
    RequiresConfirmation { untrusted_retailers: Vec<String> },

    /// Untrusted items present and the policy does not accept confirmation
    UntrustedBlocked { untrusted_retailers: Vec<String> },

    /// Payment accepted and the cart cleared
    Approved {
        receipt_id: String,
        total: f64,
        item_count: usize,
    },
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved { .. })
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Decision::RequiresConfirmation { .. })
    }

    pub fn receipt_id(&self) -> Option<&str> {
        match self {
            Decision::Approved { receipt_id, .. } => Some(receipt_id),
            _ => None,
        }
    }

    /// Human-readable message for the agent
    pub fn message(&self) -> String {
        match self {
            Decision::Empty => "Cart is empty".to_string(),
            Decision::BudgetExceeded { total, budget } => {
                format!("Budget exceeded: ${} > ${}", total, budget)
            }
            Decision::RequiresConfirmation { untrusted_retailers } => format!(
                "Payment requires confirmation: Cart contains items from {}. \
                 These retailers are not verified. \
                 Please confirm if you want to proceed with the purchase.",
                untrusted_retailers.join(", ")
            ),
            Decision::UntrustedBlocked { untrusted_retailers } => format!(
                "Payment blocked: Cart contains items from untrusted retailers: {}",
                untrusted_retailers.join(", ")
            ),
            Decision::Approved { receipt_id, .. } => {
                format!("Payment processed successfully. Receipt: {}", receipt_id)
            }
        }
    }

    /// Wire shape returned by the payment tool
    pub fn to_payment_result(&self) -> PaymentResult {
        let mut result = PaymentResult {
            success: self.is_approved(),
            receipt_id: self.receipt_id().unwrap_or_default().to_string(),
            message: self.message(),
            requires_confirmation: None,
            untrusted_retailers: None,
        };

        match self {
            Decision::RequiresConfirmation { untrusted_retailers } => {
                result.requires_confirmation = Some(true);
                result.untrusted_retailers = Some(untrusted_retailers.clone());
            }
            Decision::UntrustedBlocked { untrusted_retailers } => {
                result.untrusted_retailers = Some(untrusted_retailers.clone());
            }
            _ => {}
        }

        result
    }
}

/// Serialized payment outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,

    /// Empty unless approved
    pub receipt_id: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_confirmation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untrusted_retailers: Option<Vec<String>>,
}

/// Evaluates carts against budget and trust rules
#[derive(Clone)]
pub struct CheckoutPolicy {
    mode: ConfirmationMode,
    receipts: Arc<dyn ReceiptIssuer>,
}

impl CheckoutPolicy {
    pub fn new(mode: ConfirmationMode) -> Self {
        Self {
            mode,
            receipts: Arc::new(UuidReceipts::default()),
        }
    }

    /// Use a different receipt issuer
    pub fn with_receipts(mut self, receipts: Arc<dyn ReceiptIssuer>) -> Self {
        self.receipts = receipts;
        self
    }

    pub fn mode(&self) -> ConfirmationMode {
        self.mode
    }

    /// Decide on a cart snapshot without side effects
    pub fn evaluate(&self, cart: &Cart, user_confirmed: bool) -> Verdict {
        if cart.is_empty() {
            return Verdict::Empty;
        }

        if cart.is_over_budget() {
            return Verdict::BudgetExceeded {
                total: cart.total,
                budget: cart.budget,
            };
        }

        if cart.has_untrusted_items {
            let untrusted_retailers = cart.untrusted_retailers();
            match self.mode {
                ConfirmationMode::Strict => {
                    return Verdict::UntrustedBlocked { untrusted_retailers };
                }
                ConfirmationMode::Handshake if !user_confirmed => {
                    return Verdict::RequiresConfirmation { untrusted_retailers };
                }
                ConfirmationMode::Handshake => {}
            }
        }

        Verdict::Approve
    }

    /// Evaluate the store's current contents and, on approval, clear it
    ///
    /// The caller must hold exclusive access to `store` for the whole call;
    /// `&mut` makes the snapshot and the clear a single step.
    pub fn checkout(&self, store: &mut CartStore, user_confirmed: bool) -> Decision {
        let cart = store.snapshot();

        match self.evaluate(&cart, user_confirmed) {
            Verdict::Empty => Decision::Empty,
            Verdict::BudgetExceeded { total, budget } => {
                tracing::warn!(total, budget, "Checkout blocked: budget exceeded");
                Decision::BudgetExceeded { total, budget }
            }
            Verdict::RequiresConfirmation { untrusted_retailers } => {
                tracing::warn!(
                    retailers = ?untrusted_retailers,
                    "Checkout paused: untrusted items need confirmation"
                );
                Decision::RequiresConfirmation { untrusted_retailers }
            }
            Verdict::UntrustedBlocked { untrusted_retailers } => {
                tracing::warn!(
                    retailers = ?untrusted_retailers,
                    "Checkout blocked: untrusted items"
                );
                Decision::UntrustedBlocked { untrusted_retailers }
            }
            Verdict::Approve => {
                let receipt_id = self.receipts.issue();
                store.clear();
                tracing::info!(
                    receipt_id = %receipt_id,
                    total = cart.total,
                    items = cart.item_count(),
                    confirmed = user_confirmed,
                    "Payment approved"
                );
                Decision::Approved {
                    receipt_id,
                    total: cart.total,
                    item_count: cart.item_count(),
                }
            }
        }
    }
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self::new(ConfirmationMode::default())
    }
}

impl fmt::Debug for CheckoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutPolicy")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
