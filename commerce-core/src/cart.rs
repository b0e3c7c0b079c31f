//! Cart store - line items, budget ceiling and id allocation
//!
//! ## Lifecycle
//!
//! ```text
//!   add ──► LineItem (id = next_id++, trust = classifier(product_id, retailer))
//!              │
//!              ├── remove(id)         single item
//!              ├── clear()            all items, budget kept
//!              └── approved checkout  all items, budget kept
//! ```
//!
//! A `CartStore` is a plain owned value. Callers that share one across
//! requests wrap it in a lock and hold that lock for the whole of each
//! operation, including checkout.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::trust::{PrefixClassifier, TrustClassifier, TrustLevel};

/// Budget ceiling used when none is configured
pub const DEFAULT_BUDGET: f64 = 1000.0;

/// Request to place a product in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub retailer: String,

    /// Caller's claim about the product's trust level. Never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<TrustLevel>,
}

impl AddItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        retailer: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            retailer: retailer.into(),
            trust_level: None,
        }
    }

    /// Attach a caller-supplied trust hint
    pub fn with_trust_hint(mut self, hint: TrustLevel) -> Self {
        self.trust_level = Some(hint);
        self
    }
}

impl From<&Product> for AddItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            retailer: product.retailer.clone(),
            trust_level: Some(product.trust_level),
        }
    }
}

/// One product instance placed in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Cart-local id, unique for the lifetime of the store
    pub cart_item_id: u64,

    /// Catalog product id
    pub product_id: String,

    pub name: String,
    pub price: f64,
    pub retailer: String,

    /// Authoritative label from the store's classifier
    pub trust_level: TrustLevel,

    pub added_at: DateTime<Utc>,
}

impl LineItem {
    pub fn is_untrusted(&self) -> bool {
        self.trust_level == TrustLevel::Untrusted
    }
}

/// Aggregate trust status of a cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustStatus {
    Empty,
    AllTrusted,
    HasUntrusted,
}

impl TrustStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustStatus::Empty => "empty",
            TrustStatus::AllTrusted => "all_trusted",
            TrustStatus::HasUntrusted => "has_untrusted",
        }
    }
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Most recently added first
    pub items: Vec<LineItem>,
    pub total: f64,
    pub budget: f64,
    pub has_untrusted_items: bool,
    pub trust_status: TrustStatus,
}

impl Cart {
    fn from_items(items: Vec<LineItem>, budget: f64) -> Self {
        let total = items.iter().map(|item| item.price).sum();
        let has_untrusted_items = items.iter().any(LineItem::is_untrusted);
        let trust_status = if items.is_empty() {
            TrustStatus::Empty
        } else if has_untrusted_items {
            TrustStatus::HasUntrusted
        } else {
            TrustStatus::AllTrusted
        };

        Self {
            items,
            total,
            budget,
            has_untrusted_items,
            trust_status,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Budget headroom; negative when over budget
    pub fn remaining(&self) -> f64 {
        self.budget - self.total
    }

    pub fn is_over_budget(&self) -> bool {
        self.total > self.budget
    }

    /// Distinct retailers of untrusted items, in snapshot order
    pub fn untrusted_retailers(&self) -> Vec<String> {
        let mut retailers: Vec<String> = Vec::new();
        for item in self.items.iter().filter(|item| item.is_untrusted()) {
            if !retailers.contains(&item.retailer) {
                retailers.push(item.retailer.clone());
            }
        }
        retailers
    }
}

/// Owns the line items, budget ceiling and id counter of one cart
pub struct CartStore {
    items: BTreeMap<u64, LineItem>,
    budget: f64,
    next_id: u64,
    classifier: Arc<dyn TrustClassifier>,
}

impl CartStore {
    /// Create an empty cart with the default budget and trust rules
    pub fn new() -> Self {
        Self::with_classifier(DEFAULT_BUDGET, Arc::new(PrefixClassifier::default()))
    }

    /// Create an empty cart with a given budget and classifier
    pub fn with_classifier(budget: f64, classifier: Arc<dyn TrustClassifier>) -> Self {
        Self {
            items: BTreeMap::new(),
            budget,
            next_id: 1,
            classifier,
        }
    }

    /// Set the budget at construction time
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = budget;
        self
    }

    /// Add an item, classifying its trust from the product id and retailer
    pub fn add(&mut self, request: AddItem) -> LineItem {
        let cart_item_id = self.next_id;
        self.next_id += 1;

        let trust_level = self.classifier.classify(&request.product_id, &request.retailer);
        if let Some(hint) = request.trust_level {
            if hint != trust_level {
                tracing::debug!(
                    product_id = %request.product_id,
                    claimed = %hint,
                    derived = %trust_level,
                    "Ignoring caller trust hint"
                );
            }
        }

        let item = LineItem {
            cart_item_id,
            product_id: request.product_id,
            name: request.name,
            price: request.price,
            retailer: request.retailer,
            trust_level,
            added_at: Utc::now(),
        };

        tracing::debug!(
            cart_item_id,
            product_id = %item.product_id,
            trust = %trust_level,
            "Added cart item"
        );

        self.items.insert(cart_item_id, item.clone());
        item
    }

    /// Remove an item by cart id; returns whether it was present
    pub fn remove(&mut self, cart_item_id: u64) -> bool {
        let removed = self.items.remove(&cart_item_id).is_some();
        tracing::debug!(cart_item_id, removed, "Remove cart item");
        removed
    }

    /// Look up a single item
    pub fn get(&self, cart_item_id: u64) -> Option<&LineItem> {
        self.items.get(&cart_item_id)
    }

    /// Consistent view with derived totals, most recently added first
    pub fn snapshot(&self) -> Cart {
        let items = self.items.values().rev().cloned().collect();
        Cart::from_items(items, self.budget)
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Replace the budget ceiling; existing items are kept
    pub fn set_budget(&mut self, amount: f64) {
        tracing::info!(old = self.budget, new = amount, "Budget updated");
        self.budget = amount;
    }

    /// Remove all items; budget and id counter are kept
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .field("budget", &self.budget)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macbook() -> AddItem {
        AddItem::new("th-001", "MacBook Pro 14\" M3", 1599.0, "TechHub")
    }

    fn esp32() -> AddItem {
        AddItem::new("iot-003", "ESP32 DevKit V1 (30-pin)", 12.0, "IoTMarket")
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut store = CartStore::new();

        let first = store.add(macbook());
        let second = store.add(esp32());

        assert_eq!(first.cart_item_id, 1);
        assert_eq!(second.cart_item_id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_remove_or_clear() {
        let mut store = CartStore::new();

        let first = store.add(macbook());
        assert!(store.remove(first.cart_item_id));
        let second = store.add(macbook());
        store.clear();
        let third = store.add(macbook());

        assert_eq!(second.cart_item_id, 2);
        assert_eq!(third.cart_item_id, 3);
    }

    #[test]
    fn test_trust_hint_is_ignored() {
        let mut store = CartStore::new();

        let item = store.add(esp32().with_trust_hint(TrustLevel::Trusted));
        assert_eq!(item.trust_level, TrustLevel::Untrusted);

        let item = store.add(macbook().with_trust_hint(TrustLevel::Untrusted));
        assert_eq!(item.trust_level, TrustLevel::Trusted);
    }

    #[test]
    fn test_snapshot_orders_most_recent_first() {
        let mut store = CartStore::new();
        store.add(macbook());
        store.add(esp32());
        store.add(AddItem::new("gz-009", "Anker USB-C to Lightning Cable 6ft", 19.0, "GadgetZone"));

        let cart = store.snapshot();
        let ids: Vec<u64> = cart.items.iter().map(|i| i.cart_item_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_snapshot_derived_values() {
        let mut store = CartStore::new();

        let empty = store.snapshot();
        assert_eq!(empty.trust_status, TrustStatus::Empty);
        assert_eq!(empty.total, 0.0);
        assert!(!empty.has_untrusted_items);

        store.add(macbook());
        let trusted = store.snapshot();
        assert_eq!(trusted.trust_status, TrustStatus::AllTrusted);
        assert_eq!(trusted.total, 1599.0);

        store.add(esp32());
        let mixed = store.snapshot();
        assert_eq!(mixed.trust_status, TrustStatus::HasUntrusted);
        assert!(mixed.has_untrusted_items);
        assert_eq!(mixed.total, 1611.0);
        assert_eq!(mixed.remaining(), 1000.0 - 1611.0);
        assert!(mixed.is_over_budget());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = CartStore::new();
        let keep = store.add(macbook());
        let drop = store.add(esp32());

        assert!(store.remove(drop.cart_item_id));
        assert_eq!(store.snapshot().total, keep.price);

        assert!(!store.remove(drop.cart_item_id));
        assert_eq!(store.snapshot().total, keep.price);

        assert!(!store.remove(999));
    }

    #[test]
    fn test_clear_keeps_budget() {
        let mut store = CartStore::new();
        store.set_budget(250.0);
        store.add(esp32());

        store.clear();

        let cart = store.snapshot();
        assert!(cart.is_empty());
        assert_eq!(cart.budget, 250.0);
    }

    #[test]
    fn test_set_budget_does_not_touch_items() {
        let mut store = CartStore::new();
        store.add(macbook());

        store.set_budget(10.0);

        let cart = store.snapshot();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.budget, 10.0);
        assert!(cart.is_over_budget());
    }

    #[test]
    fn test_untrusted_retailers_are_distinct() {
        let mut store = CartStore::new();
        store.add(esp32());
        store.add(macbook());
        store.add(AddItem::new("iot-004", "DHT22 Sensor", 8.0, "IoTMarket"));
        store.add(AddItem::new("x-1", "Mystery Box", 5.0, "iotmarket"));

        let cart = store.snapshot();
        assert_eq!(
            cart.untrusted_retailers(),
            vec!["iotmarket".to_string(), "IoTMarket".to_string()]
        );
    }

    #[test]
    fn test_cart_serialization() {
        let mut store = CartStore::new();
        store.add(esp32());

        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["trust_status"], "has_untrusted");
        assert_eq!(json["items"][0]["trust_level"], "untrusted");
        assert_eq!(json["items"][0]["cart_item_id"], 1);
    }
}
