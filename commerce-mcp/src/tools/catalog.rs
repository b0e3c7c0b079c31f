//! Catalog service tools for one retailer

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use commerce_core::{Catalog, Product, Retailer, SearchQuery, TrustLevel};

use super::{parse_args, to_value, ToolDefinition};
use crate::error::{McpError, McpResult};

pub const SEARCH_PRODUCTS: &str = "search_products";
pub const GET_PRODUCT: &str = "get_product";
pub const COMPARE_PRODUCTS: &str = "compare_products";
pub const LIST_CATEGORIES: &str = "list_categories";

#[derive(Debug, Serialize)]
pub struct SearchOutput<'a> {
    pub retailer: &'a str,
    pub trust_level: TrustLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'a str>,
    pub product_count: usize,
    /// Matches before the limit was applied
    pub total: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct GetProductInput {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareInput {
    pub product_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareOutput<'a> {
    pub retailer: &'a str,
    pub products: Vec<&'a Product>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_found: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesOutput<'a> {
    pub retailer: &'a str,
    pub trust_level: TrustLevel,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

/// Tools over a single retailer's catalog
pub struct CatalogTools {
    catalog: Arc<dyn Catalog>,
}

impl CatalogTools {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Tools over a bundled retailer catalog
    pub fn for_retailer(retailer: Retailer) -> McpResult<Self> {
        Ok(Self::new(Arc::new(retailer.catalog()?)))
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let catalog = self.catalog.as_ref();
        let mut search_description = format!(
            "Search the {} catalog. Returns products with trust_level='{}'.",
            catalog.retailer(),
            catalog.trust_level()
        );
        if let Some(warning) = catalog.warning() {
            search_description.push_str(&format!(" WARNING: {}.", warning));
        }

        vec![
            ToolDefinition::new(
                SEARCH_PRODUCTS,
                search_description,
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Search query (product name or keywords)" },
                        "category": {
                            "type": "string",
                            "enum": catalog.categories(),
                            "description": "Optional product category filter"
                        },
                        "brand": {
                            "type": "string",
                            "enum": catalog.brands(),
                            "description": "Optional brand filter"
                        },
                        "min_price": { "type": "number", "description": "Optional minimum price filter" },
                        "max_price": { "type": "number", "description": "Optional maximum price filter" },
                        "in_stock": { "type": "boolean", "description": "Only return products in stock" },
                        "sort_by": {
                            "type": "string",
                            "enum": ["relevance", "price_asc", "price_desc", "rating", "name"],
                            "description": "Result ordering (default relevance)"
                        },
                        "limit": { "type": "integer", "minimum": 1, "description": "Maximum results (default 50)" }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                GET_PRODUCT,
                format!("Get full details of one {} product by ID", catalog.retailer()),
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": { "type": "string", "description": "Product ID" }
                    },
                    "required": ["product_id"]
                }),
            ),
            ToolDefinition::new(
                COMPARE_PRODUCTS,
                "Compare several products side by side",
                json!({
                    "type": "object",
                    "properties": {
                        "product_ids": {
                            "type": "array",
                            "items": { "type": "string" },
                            "minItems": 1,
                            "description": "Product IDs to compare"
                        }
                    },
                    "required": ["product_ids"]
                }),
            ),
            ToolDefinition::new(
                LIST_CATEGORIES,
                "List the categories and brands this retailer carries",
                json!({ "type": "object", "properties": {} }),
            ),
        ]
    }

    /// Dispatch a call by tool name
    pub fn call(&self, name: &str, arguments: Value) -> McpResult<Value> {
        match name {
            SEARCH_PRODUCTS => to_value(self.search_products(&parse_args(arguments)?)?),
            GET_PRODUCT => to_value(self.get_product(parse_args(arguments)?)?),
            COMPARE_PRODUCTS => to_value(self.compare_products(parse_args(arguments)?)?),
            LIST_CATEGORIES => to_value(self.list_categories()),
            other => Err(McpError::UnknownTool(other.to_string())),
        }
    }

    pub fn search_products(&self, query: &SearchQuery) -> McpResult<SearchOutput<'_>> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(McpError::InvalidParams(format!(
                    "min_price {} is above max_price {}",
                    min, max
                )));
            }
        }

        let catalog = self.catalog.as_ref();
        let results = catalog.search(query);
        tracing::debug!(
            retailer = catalog.retailer(),
            query = %query.query,
            matches = results.total,
            "Catalog search"
        );

        Ok(SearchOutput {
            retailer: catalog.retailer(),
            trust_level: catalog.trust_level(),
            warning: catalog.warning(),
            product_count: results.products.len(),
            total: results.total,
            products: results.products,
        })
    }

    pub fn get_product(&self, input: GetProductInput) -> McpResult<&Product> {
        Ok(self.catalog.get_product(&input.product_id)?)
    }

    pub fn compare_products(&self, input: CompareInput) -> McpResult<CompareOutput<'_>> {
        if input.product_ids.is_empty() {
            return Err(McpError::InvalidParams("product_ids must not be empty".to_string()));
        }

        let catalog = self.catalog.as_ref();
        let products = catalog.compare(&input.product_ids);
        let not_found = input
            .product_ids
            .iter()
            .filter(|id| !products.iter().any(|p| &p.id == *id))
            .cloned()
            .collect();

        Ok(CompareOutput {
            retailer: catalog.retailer(),
            products,
            not_found,
        })
    }

    pub fn list_categories(&self) -> CategoriesOutput<'_> {
        let catalog = self.catalog.as_ref();
        CategoriesOutput {
            retailer: catalog.retailer(),
            trust_level: catalog.trust_level(),
            categories: catalog.categories(),
            brands: catalog.brands(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_core::SortBy;

    fn iotmarket() -> CatalogTools {
        CatalogTools::for_retailer(Retailer::IoTMarket).unwrap()
    }

    #[test]
    fn test_search_carries_warning_and_trust() {
        let tools = iotmarket();
        let out = tools.search_products(&SearchQuery::new("sensor")).unwrap();

        assert_eq!(out.retailer, "IoTMarket");
        assert_eq!(out.trust_level, TrustLevel::Untrusted);
        assert_eq!(out.warning, Some("New marketplace - verify seller before purchase"));
        assert_eq!(out.product_count, out.products.len());
        assert!(out.products.iter().all(|p| p.trust_level == TrustLevel::Untrusted));
    }

    #[test]
    fn test_trusted_search_has_no_warning() {
        let tools = CatalogTools::for_retailer(Retailer::TechHub).unwrap();
        let value = tools
            .call(SEARCH_PRODUCTS, json!({"query": "dell", "sort_by": "price_asc"}))
            .unwrap();

        assert!(value.get("warning").is_none());
        assert_eq!(value["trust_level"], "trusted");
        assert_eq!(value["products"][0]["id"], "th-006");
        assert_eq!(value["products"][1]["id"], "th-002");
    }

    #[test]
    fn test_search_rejects_inverted_price_range() {
        let query = SearchQuery::new("pi").min_price(100.0).max_price(10.0);
        assert!(matches!(
            iotmarket().search_products(&query),
            Err(McpError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_search_filters() {
        let tools = iotmarket();

        let query = SearchQuery::new("raspberry").category("microcontroller");
        let out = tools.search_products(&query).unwrap();
        assert_eq!(out.products.len(), 1);
        assert_eq!(out.products[0].id, "iot-007");

        let query = SearchQuery::new("wifi").max_price(30.0).sort_by(SortBy::PriceAsc);
        let ids: Vec<String> = tools
            .search_products(&query)
            .unwrap()
            .products
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["iot-003", "iot-002"]);
    }

    #[test]
    fn test_get_product_unknown() {
        let err = iotmarket()
            .get_product(GetProductInput { product_id: "th-001".into() })
            .unwrap_err();
        assert_eq!(err.error_code(), -32002);
    }

    #[test]
    fn test_compare_reports_missing() {
        let tools = iotmarket();
        let out = tools
            .compare_products(CompareInput {
                product_ids: vec!["iot-003".into(), "nope".into(), "iot-002".into()],
            })
            .unwrap();

        let ids: Vec<&str> = out.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["iot-003", "iot-002"]);
        assert_eq!(out.not_found, vec!["nope".to_string()]);

        assert!(tools
            .compare_products(CompareInput { product_ids: vec![] })
            .is_err());
    }

    #[test]
    fn test_list_categories() {
        let binding = iotmarket();
        let out = binding.list_categories();
        assert_eq!(
            out.categories,
            vec!["iot_kit", "microcontroller", "sensor", "smart_home"]
        );
        assert!(out.brands.contains(&"Arduino".to_string()));
    }

    #[test]
    fn test_definitions_enumerate_categories() {
        let defs = iotmarket().definitions();
        assert_eq!(defs.len(), 4);
        let search = &defs[0];
        assert!(search.description.contains("WARNING"));
        assert_eq!(
            search.input_schema["properties"]["category"]["enum"][0],
            "iot_kit"
        );
    }
}
