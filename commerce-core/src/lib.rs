//! # Commerce Core - trust-gated carts for agents
//!
//! Agents browse retailer catalogs and place products into a cart. Before
//! any payment goes through, the cart is checked against a spending budget
//! and a trust policy:
//!
//! - **Trust**: every line item's trust label is derived by a
//!   [`TrustClassifier`] from the product id and retailer. Whatever the
//!   caller claims is ignored.
//! - **Cart**: [`CartStore`] owns line items, the budget ceiling and id
//!   allocation, and produces consistent [`Cart`] snapshots.
//! - **Checkout**: [`CheckoutPolicy`] decides `Empty`, `BudgetExceeded`,
//!   `RequiresConfirmation` or `Approved`, in that order.
//!
//! ## Example
//!
//! ```rust
//! use commerce_core::{AddItem, CartStore, CheckoutPolicy, Decision};
//!
//! let mut cart = CartStore::new();
//! let policy = CheckoutPolicy::default();
//!
//! cart.add(AddItem::new("iot-003", "ESP32 DevKit V1", 12.0, "IoTMarket"));
//!
//! // Untrusted items need the user's confirmation
//! let first = policy.checkout(&mut cart, false);
//! assert!(first.requires_confirmation());
//! assert_eq!(cart.len(), 1);
//!
//! // Confirmed: receipt issued and cart cleared
//! let second = policy.checkout(&mut cart, true);
//! assert!(matches!(second, Decision::Approved { .. }));
//! assert!(cart.is_empty());
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod trust;

// Re-export main types
pub use cart::{AddItem, Cart, CartStore, LineItem, TrustStatus, DEFAULT_BUDGET};
pub use catalog::{Catalog, Product, Retailer, SearchQuery, SearchResults, SortBy, StaticCatalog};
pub use checkout::{
    CheckoutPolicy, ConfirmationMode, Decision, PaymentResult, ReceiptIssuer, UuidReceipts, Verdict,
};
pub use config::{CommerceConfig, CommerceConfigBuilder};
pub use error::{CommerceError, ErrorCategory, ErrorDetail, ErrorResponse, Result};
pub use trust::{classify, PrefixClassifier, TrustClassifier, TrustLevel, TrustRules};
