//! Product search - multi-word relevance scoring
//!
//! The query is lowercased and split on whitespace; single-character words
//! are dropped. Each remaining word is scored against a product:
//!
//! | field    | weight |
//! |----------|--------|
//! | name     | 3      |
//! | brand    | 2      |
//! | tags     | 2      |
//! | category | 1      |
//!
//! A product matching every word gets its score multiplied by 1.5.
//! Products scoring zero are dropped before filters are applied.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Product;

/// Results returned when no limit is given
pub const DEFAULT_LIMIT: usize = 50;

const NAME_WEIGHT: f64 = 3.0;
const BRAND_WEIGHT: f64 = 2.0;
const TAG_WEIGHT: f64 = 2.0;
const CATEGORY_WEIGHT: f64 = 1.0;
const ALL_WORDS_BOOST: f64 = 1.5;

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

/// Search request with optional filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    /// Only return products currently in stock
    #[serde(default, rename = "in_stock")]
    pub in_stock_only: bool,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Lowercased query words longer than one character
    pub fn words(&self) -> Vec<String> {
        self.query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.chars().count() > 1)
            .map(str::to_string)
            .collect()
    }

    fn accepts(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if &product.brand != brand {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        !(self.in_stock_only && !product.in_stock)
    }
}

/// Ranked search output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Ranked products, truncated to the limit
    pub products: Vec<Product>,

    /// Matches before the limit was applied
    pub total: usize,
}

/// Relevance of one product for a set of query words
pub fn score(product: &Product, words: &[String]) -> f64 {
    let name = product.name.to_lowercase();
    let brand = product.brand.to_lowercase();
    let category = product.category.to_lowercase();
    let tags = product.tags.join(" ").to_lowercase();

    let mut total = 0.0;
    let mut matched = 0;

    for word in words {
        let mut word_score = 0.0;
        if name.contains(word.as_str()) {
            word_score += NAME_WEIGHT;
        }
        if brand.contains(word.as_str()) {
            word_score += BRAND_WEIGHT;
        }
        if tags.contains(word.as_str()) {
            word_score += TAG_WEIGHT;
        }
        if category.contains(word.as_str()) {
            word_score += CATEGORY_WEIGHT;
        }

        if word_score > 0.0 {
            total += word_score;
            matched += 1;
        }
    }

    if matched > 0 && matched == words.len() {
        total *= ALL_WORDS_BOOST;
    }

    total
}

/// Score, filter, sort and truncate a product list
pub fn search(products: &[Product], query: &SearchQuery) -> SearchResults {
    let words = query.words();
    if words.is_empty() {
        return SearchResults {
            products: Vec::new(),
            total: 0,
        };
    }

    let mut scored: Vec<(f64, &Product)> = products
        .iter()
        .map(|p| (score(p, &words), p))
        .filter(|(s, p)| *s > 0.0 && query.accepts(p))
        .collect();

    // Relevance first; other orderings are stable on top of it
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    match query.sort_by {
        SortBy::Relevance => {}
        SortBy::PriceAsc => scored.sort_by(|a, b| a.1.price.total_cmp(&b.1.price)),
        SortBy::PriceDesc => scored.sort_by(|a, b| b.1.price.total_cmp(&a.1.price)),
        SortBy::Rating => scored.sort_by(|a, b| b.1.rating.total_cmp(&a.1.rating)),
        SortBy::Name => scored.sort_by(|a, b| compare_names(&a.1.name, &b.1.name)),
    }

    let total = scored.len();
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);

    SearchResults {
        products: scored.into_iter().take(limit).map(|(_, p)| p.clone()).collect(),
        total,
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
