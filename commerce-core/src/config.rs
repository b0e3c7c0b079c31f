//! Configuration for carts and checkout
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. JSON config file ([`CommerceConfig::from_file`])
//! 3. Environment (`COMMERCE_BUDGET`, `COMMERCE_CONFIRMATION_MODE`)
//! 4. Explicit overrides through the builder

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cart::{CartStore, DEFAULT_BUDGET};
use crate::checkout::{CheckoutPolicy, ConfirmationMode, UuidReceipts, DEFAULT_RECEIPT_PREFIX};
use crate::error::{CommerceError, Result};
use crate::trust::{PrefixClassifier, TrustClassifier, TrustRules};

pub const ENV_BUDGET: &str = "COMMERCE_BUDGET";
pub const ENV_CONFIRMATION_MODE: &str = "COMMERCE_CONFIRMATION_MODE";

/// Cart and checkout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommerceConfig {
    /// Budget ceiling for new carts
    #[serde(default = "default_budget")]
    pub default_budget: f64,

    /// Prefix for receipt identifiers
    #[serde(default = "default_receipt_prefix")]
    pub receipt_prefix: String,

    #[serde(default)]
    pub confirmation_mode: ConfirmationMode,

    #[serde(default)]
    pub trust_rules: TrustRules,
}

fn default_budget() -> f64 {
    DEFAULT_BUDGET
}

fn default_receipt_prefix() -> String {
    DEFAULT_RECEIPT_PREFIX.to_string()
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            default_budget: default_budget(),
            receipt_prefix: default_receipt_prefix(),
            confirmation_mode: ConfirmationMode::default(),
            trust_rules: TrustRules::default(),
        }
    }
}

impl CommerceConfig {
    pub fn builder() -> CommerceConfigBuilder {
        CommerceConfigBuilder::default()
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CommerceError::InvalidConfig {
            field: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with the environment applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Apply `COMMERCE_*` environment variables on top of this config
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_BUDGET) {
            self.default_budget = raw.trim().parse().map_err(|_| CommerceError::InvalidConfig {
                field: ENV_BUDGET.to_string(),
                reason: format!("'{}' is not a number", raw),
            })?;
        }

        if let Some(raw) = lookup(ENV_CONFIRMATION_MODE) {
            self.confirmation_mode = raw.trim().parse().map_err(|reason| CommerceError::InvalidConfig {
                field: ENV_CONFIRMATION_MODE.to_string(),
                reason,
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_budget(self.default_budget).map_err(|reason| CommerceError::InvalidConfig {
            field: "default_budget".to_string(),
            reason,
        })?;

        if self.receipt_prefix.trim().is_empty() {
            return Err(CommerceError::InvalidConfig {
                field: "receipt_prefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Classifier built from the configured trust rules
    pub fn classifier(&self) -> Arc<dyn TrustClassifier> {
        Arc::new(PrefixClassifier::new(self.trust_rules.clone()))
    }

    /// Checkout policy for the configured mode and receipt prefix
    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy::new(self.confirmation_mode)
            .with_receipts(Arc::new(UuidReceipts::new(self.receipt_prefix.clone())))
    }

    /// Fresh empty cart with the configured budget
    pub fn new_cart(&self, classifier: Arc<dyn TrustClassifier>) -> CartStore {
        CartStore::with_classifier(self.default_budget, classifier)
    }
}

/// Check that an amount can serve as a budget ceiling
pub fn validate_budget(amount: f64) -> std::result::Result<(), String> {
    if !amount.is_finite() {
        return Err(format!("{} is not a finite amount", amount));
    }
    if amount < 0.0 {
        return Err(format!("{} is negative", amount));
    }
    Ok(())
}

/// Builder for CommerceConfig
#[derive(Debug, Default)]
pub struct CommerceConfigBuilder {
    base: Option<CommerceConfig>,
    default_budget: Option<f64>,
    receipt_prefix: Option<String>,
    confirmation_mode: Option<ConfirmationMode>,
    trust_rules: Option<TrustRules>,
}

impl CommerceConfigBuilder {
    /// Start from an existing config instead of the defaults
    pub fn base(mut self, config: CommerceConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn default_budget(mut self, amount: f64) -> Self {
        self.default_budget = Some(amount);
        self
    }

    pub fn receipt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.receipt_prefix = Some(prefix.into());
        self
    }

    pub fn confirmation_mode(mut self, mode: ConfirmationMode) -> Self {
        self.confirmation_mode = Some(mode);
        self
    }

    pub fn trust_rules(mut self, rules: TrustRules) -> Self {
        self.trust_rules = Some(rules);
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<CommerceConfig> {
        let base = self.base.unwrap_or_default();
        let config = CommerceConfig {
            default_budget: self.default_budget.unwrap_or(base.default_budget),
            receipt_prefix: self.receipt_prefix.unwrap_or(base.receipt_prefix),
            confirmation_mode: self.confirmation_mode.unwrap_or(base.confirmation_mode),
            trust_rules: self.trust_rules.unwrap_or(base.trust_rules),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::TrustLevel;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CommerceConfig::default();
        assert_eq!(config.default_budget, 1000.0);
        assert_eq!(config.receipt_prefix, "RCP");
        assert_eq!(config.confirmation_mode, ConfirmationMode::Handshake);
        assert_eq!(config.trust_rules.fallback, TrustLevel::Trusted);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CommerceConfig =
            serde_json::from_str(r#"{"default_budget": 250, "confirmation_mode": "strict"}"#).unwrap();
        assert_eq!(config.default_budget, 250.0);
        assert_eq!(config.confirmation_mode, ConfirmationMode::Strict);
        assert_eq!(config.receipt_prefix, "RCP");
    }

    #[test]
    fn test_env_overlay() {
        let config = CommerceConfig::default()
            .with_vars(vars(&[(ENV_BUDGET, " 42.5 "), (ENV_CONFIRMATION_MODE, "strict")]))
            .unwrap();
        assert_eq!(config.default_budget, 42.5);
        assert_eq!(config.confirmation_mode, ConfirmationMode::Strict);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let err = CommerceConfig::default()
            .with_vars(vars(&[(ENV_BUDGET, "lots")]))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = CommerceConfig::default()
            .with_vars(vars(&[(ENV_BUDGET, "-5")]))
            .unwrap_err();
        assert!(err.to_string().contains("negative"));

        assert!(CommerceConfig::default()
            .with_vars(vars(&[(ENV_CONFIRMATION_MODE, "maybe")]))
            .is_err());
    }

    #[test]
    fn test_builder_overrides_base() {
        let base = CommerceConfig {
            default_budget: 10.0,
            ..CommerceConfig::default()
        };
        let config = CommerceConfig::builder()
            .base(base)
            .receipt_prefix("ORD")
            .build()
            .unwrap();

        assert_eq!(config.default_budget, 10.0);
        assert_eq!(config.receipt_prefix, "ORD");
    }

    #[test]
    fn test_builder_validates() {
        assert!(CommerceConfig::builder().default_budget(f64::NAN).build().is_err());
        assert!(CommerceConfig::builder().receipt_prefix(" ").build().is_err());
        assert!(CommerceConfig::builder().default_budget(0.0).build().is_ok());
    }

    #[test]
    fn test_configured_receipts_and_cart() {
        let config = CommerceConfig::builder()
            .default_budget(300.0)
            .receipt_prefix("ORD")
            .build()
            .unwrap();

        let mut cart = config.new_cart(config.classifier());
        assert_eq!(cart.budget(), 300.0);

        cart.add(crate::cart::AddItem::new("th-007", "Mouse", 99.0, "TechHub"));
        let decision = config.checkout_policy().checkout(&mut cart, false);
        assert!(decision.receipt_id().unwrap().starts_with("ORD-"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = CommerceConfig::from_file("/nonexistent/commerce.json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
