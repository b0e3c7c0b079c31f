//! Catalog - retailer product lists and search
//!
//! Catalogs are collaborators of the cart: they hand out products with a
//! retailer-declared trust level, and the cart re-derives trust on its own
//! when a product is added.
//!
//! ## Bundled retailers
//!
//! ```text
//!   TechHub     th-*   trusted    laptop, tablet, monitor, accessory
//!   GadgetZone  gz-*   trusted    phone, accessory, cable, charger
//!   IoTMarket   iot-*  untrusted  iot_kit, sensor, smart_home, microcontroller
//! ```

mod search;

pub use search::{score, search, SearchQuery, SearchResults, SortBy, DEFAULT_LIMIT};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CommerceError, Result};
use crate::trust::TrustLevel;

/// Immutable product reference supplied by a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub rating: f64,
    pub in_stock: bool,
    pub retailer: String,

    /// Trust level declared by the retailer
    pub trust_level: TrustLevel,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub brand: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Product as stored in a catalog data file, before stamping
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    name: String,
    price: f64,
    category: String,
    #[serde(default)]
    rating: f64,
    #[serde(default = "default_in_stock")]
    in_stock: bool,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_in_stock() -> bool {
    true
}

/// A retailer's searchable product list
pub trait Catalog: Send + Sync {
    /// Retailer display name
    fn retailer(&self) -> &str;

    /// Trust level the retailer declares for all of its products
    fn trust_level(&self) -> TrustLevel;

    fn products(&self) -> &[Product];

    /// Caution shown alongside search results, if any
    fn warning(&self) -> Option<&str> {
        None
    }

    fn search(&self, query: &SearchQuery) -> SearchResults {
        search(self.products(), query)
    }

    fn get_product(&self, product_id: &str) -> Result<&Product> {
        self.products()
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CommerceError::ProductNotFound {
                product_id: product_id.to_string(),
                retailer: self.retailer().to_string(),
            })
    }

    /// Products for the given ids, in request order; unknown ids are skipped
    fn compare(&self, product_ids: &[String]) -> Vec<&Product> {
        product_ids
            .iter()
            .filter_map(|id| self.get_product(id).ok())
            .collect()
    }

    /// Sorted distinct categories
    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.products().iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Sorted distinct non-empty brands
    fn brands(&self) -> Vec<String> {
        let mut brands: Vec<String> = self
            .products()
            .iter()
            .filter(|p| !p.brand.is_empty())
            .map(|p| p.brand.clone())
            .collect();
        brands.sort();
        brands.dedup();
        brands
    }
}

/// In-memory catalog loaded from a JSON product list
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    retailer: String,
    trust_level: TrustLevel,
    warning: Option<String>,
    products: Vec<Product>,
}

impl StaticCatalog {
    /// Parse a JSON array of products and stamp each with retailer and trust
    pub fn from_json(retailer: &str, trust_level: TrustLevel, json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| CommerceError::InvalidCatalog {
                retailer: retailer.to_string(),
                reason: e.to_string(),
            })?;

        let products = entries
            .into_iter()
            .map(|entry| Product {
                id: entry.id,
                name: entry.name,
                price: entry.price,
                category: entry.category,
                rating: entry.rating,
                in_stock: entry.in_stock,
                retailer: retailer.to_string(),
                trust_level,
                brand: entry.brand,
                tags: entry.tags,
            })
            .collect();

        Ok(Self {
            retailer: retailer.to_string(),
            trust_level,
            warning: None,
            products,
        })
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

impl Catalog for StaticCatalog {
    fn retailer(&self) -> &str {
        &self.retailer
    }

    fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    fn products(&self) -> &[Product] {
        &self.products
    }

    fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
}

/// Retailers with a bundled catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retailer {
    TechHub,
    GadgetZone,
    IoTMarket,
}

impl Retailer {
    pub const ALL: [Retailer; 3] = [Retailer::TechHub, Retailer::GadgetZone, Retailer::IoTMarket];

    /// Display name, as stamped on products
    pub fn name(self) -> &'static str {
        match self {
            Retailer::TechHub => "TechHub",
            Retailer::GadgetZone => "GadgetZone",
            Retailer::IoTMarket => "IoTMarket",
        }
    }

    pub fn trust_level(self) -> TrustLevel {
        match self {
            Retailer::TechHub | Retailer::GadgetZone => TrustLevel::Trusted,
            Retailer::IoTMarket => TrustLevel::Untrusted,
        }
    }

    /// One-line description of what the retailer sells
    pub fn description(self) -> &'static str {
        match self {
            Retailer::TechHub => "TechHub electronics catalog",
            Retailer::GadgetZone => "GadgetZone mobile electronics catalog",
            Retailer::IoTMarket => "IoTMarket hobbyist electronics catalog",
        }
    }

    fn data(self) -> &'static str {
        match self {
            Retailer::TechHub => include_str!("../../catalogs/techhub.json"),
            Retailer::GadgetZone => include_str!("../../catalogs/gadgetzone.json"),
            Retailer::IoTMarket => include_str!("../../catalogs/iotmarket.json"),
        }
    }

    /// Load the bundled catalog
    pub fn catalog(self) -> Result<StaticCatalog> {
        let catalog = StaticCatalog::from_json(self.name(), self.trust_level(), self.data())?;
        Ok(match self {
            Retailer::IoTMarket => catalog.with_warning("New marketplace - verify seller before purchase"),
            _ => catalog,
        })
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Retailer {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self> {
        Retailer::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CommerceError::UnknownRetailer { name: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::classify;

    #[test]
    fn test_bundled_catalogs_load() {
        for retailer in Retailer::ALL {
            let catalog = retailer.catalog().unwrap();
            assert_eq!(catalog.products().len(), 10);
            assert_eq!(catalog.retailer(), retailer.name());
            assert!(catalog
                .products()
                .iter()
                .all(|p| p.retailer == retailer.name() && p.trust_level == retailer.trust_level()));
        }
    }

    #[test]
    fn test_declared_trust_agrees_with_classifier() {
        for retailer in Retailer::ALL {
            let catalog = retailer.catalog().unwrap();
            for product in catalog.products() {
                assert_eq!(classify(&product.id, &product.retailer), product.trust_level);
            }
        }
    }

    #[test]
    fn test_iotmarket_carries_warning() {
        assert!(Retailer::IoTMarket.catalog().unwrap().warning().is_some());
        assert!(Retailer::TechHub.catalog().unwrap().warning().is_none());
    }

    #[test]
    fn test_get_product() {
        let catalog = Retailer::TechHub.catalog().unwrap();

        let product = catalog.get_product("th-001").unwrap();
        assert_eq!(product.price, 1599.0);

        let err = catalog.get_product("gz-001").unwrap_err();
        assert_eq!(err.error_code(), "PRODUCT_NOT_FOUND");
    }

    #[test]
    fn test_compare_skips_unknown_ids() {
        let catalog = Retailer::GadgetZone.catalog().unwrap();
        let ids = vec!["gz-003".to_string(), "nope".to_string(), "gz-001".to_string()];

        let compared: Vec<&str> = catalog.compare(&ids).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(compared, vec!["gz-003", "gz-001"]);
    }

    #[test]
    fn test_categories_and_brands() {
        let catalog = Retailer::IoTMarket.catalog().unwrap();
        assert_eq!(
            catalog.categories(),
            vec!["iot_kit", "microcontroller", "sensor", "smart_home"]
        );
        assert!(catalog.brands().contains(&"Raspberry Pi".to_string()));
    }

    #[test]
    fn test_search_bundled_catalog() {
        let catalog = Retailer::IoTMarket.catalog().unwrap();
        let results = catalog.search(&SearchQuery::new("temperature sensor").sort_by(SortBy::PriceAsc));

        let ids: Vec<&str> = results.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids[0], "iot-005");
        assert!(ids.contains(&"iot-004"));
        assert!(ids.contains(&"iot-008"));
    }

    #[test]
    fn test_invalid_catalog_json() {
        let err = StaticCatalog::from_json("Broken", TrustLevel::Trusted, "{not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CATALOG");
    }

    #[test]
    fn test_retailer_parsing() {
        assert_eq!("techhub".parse::<Retailer>().unwrap(), Retailer::TechHub);
        assert_eq!("IoTMarket".parse::<Retailer>().unwrap(), Retailer::IoTMarket);
        assert!("acme".parse::<Retailer>().is_err());
    }
}
