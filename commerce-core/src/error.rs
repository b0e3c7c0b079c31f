//! Error types for commerce operations
//!
//! Business outcomes (an empty cart, a blown budget, a cart that needs the
//! user's confirmation) are never errors; they are [`Decision`] variants.
//! This module only covers faults:
//! - Catalog data that cannot be parsed
//! - Lookups of products that do not exist
//! - Invalid configuration values
//! - Poisoned locks and JSON failures
//!
//! Every variant carries a stable error code and a category so the
//! tool boundary can turn it into a structured response.
//!
//! [`Decision`]: crate::checkout::Decision

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for commerce operations
pub type Result<T> = std::result::Result<T, CommerceError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Resource not found
    NotFound,
    /// Input or configuration validation failed
    Validation,
    /// Bundled data is unusable
    Integrity,
    /// Internal error
    Internal,
}

/// Errors that can occur in commerce operations
#[derive(Error, Debug)]
pub enum CommerceError {
    // ═══════════════════════════════════════════════════════════════════════
    // Catalog errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Product id is not listed by the catalog
    #[error("Product not found: '{product_id}' is not listed by {retailer}.")]
    ProductNotFound { product_id: String, retailer: String },

    /// Catalog product list could not be parsed
    #[error("Invalid catalog data for {retailer}: {reason}")]
    InvalidCatalog { retailer: String, reason: String },

    /// Retailer name does not match any bundled catalog
    #[error("Unknown retailer: '{name}'. Expected one of techhub, gadgetzone, iotmarket.")]
    UnknownRetailer { name: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Configuration value is out of range or malformed
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Cart lock is poisoned (panic occurred while holding it)
    #[error("Cart lock poisoned. This is a bug; please report it.")]
    CartLocked,
}

impl CommerceError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            CommerceError::ProductNotFound { .. }
            | CommerceError::UnknownRetailer { .. } => ErrorCategory::NotFound,

            CommerceError::InvalidConfig { .. } => ErrorCategory::Validation,

            CommerceError::InvalidCatalog { .. }
            | CommerceError::JsonError(_) => ErrorCategory::Integrity,

            CommerceError::CartLocked => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CommerceError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            CommerceError::InvalidCatalog { .. } => "INVALID_CATALOG",
            CommerceError::UnknownRetailer { .. } => "UNKNOWN_RETAILER",
            CommerceError::InvalidConfig { .. } => "INVALID_CONFIG",
            CommerceError::JsonError(_) => "JSON_ERROR",
            CommerceError::CartLocked => "CART_LOCKED",
        }
    }

    /// Converts this error to a JSON-serializable response object
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "PRODUCT_NOT_FOUND",
    ///     "message": "Product not found: 'th-999' is not listed by TechHub.",
    ///     "category": "not_found"
    ///   }
    /// }
    /// ```
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "PRODUCT_NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CommerceError::ProductNotFound {
                product_id: "th-999".to_string(),
                retailer: "TechHub".to_string(),
            }
            .error_code(),
            "PRODUCT_NOT_FOUND"
        );
        assert_eq!(CommerceError::CartLocked.error_code(), "CART_LOCKED");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            CommerceError::InvalidConfig {
                field: "default_budget".to_string(),
                reason: "negative".to_string(),
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CommerceError::UnknownRetailer {
                name: "acme".to_string()
            }
            .category(),
            ErrorCategory::NotFound
        );
        assert_eq!(CommerceError::CartLocked.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_response_serialization() {
        let err = CommerceError::ProductNotFound {
            product_id: "gz-404".to_string(),
            retailer: "GadgetZone".to_string(),
        };
        let json = serde_json::to_string_pretty(&err.to_error_response()).unwrap();
        assert!(json.contains("PRODUCT_NOT_FOUND"));
        assert!(json.contains("gz-404"));
        assert!(json.contains("not_found"));

        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error.code, "PRODUCT_NOT_FOUND");
    }
}
