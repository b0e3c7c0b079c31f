//! Trust classification for catalog products
//!
//! Every cart line item gets its trust label from a [`TrustClassifier`],
//! never from the caller. Rules are evaluated in a fixed order, first match
//! wins:
//! 1. Untrusted id prefix (e.g. `iot-`)
//! 2. Trusted id prefix (e.g. `th-`, `gz-`)
//! 3. Untrusted retailer name, compared case-insensitively
//! 4. Fallback label
//!
//! The fallback is `Trusted` by default, so unknown sources pass through
//! without confirmation. Deployments that want fail-closed behavior set
//! [`TrustRules::fallback`] to `Untrusted`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Binary trust label attached to a retailer or product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Trusted,
    Untrusted,
}

impl TrustLevel {
    pub fn is_trusted(self) -> bool {
        self == TrustLevel::Trusted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::Trusted => "trusted",
            TrustLevel::Untrusted => "untrusted",
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "trusted" => Ok(TrustLevel::Trusted),
            "untrusted" => Ok(TrustLevel::Untrusted),
            other => Err(format!("unknown trust level: {}", other)),
        }
    }
}

/// Maps a product to its authoritative trust label
///
/// Implementations must be pure and total: same input, same label, no
/// failure mode.
pub trait TrustClassifier: Send + Sync {
    fn classify(&self, product_id: &str, retailer: &str) -> TrustLevel;
}

/// Rule set for [`PrefixClassifier`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRules {
    /// Id prefixes of untrusted retailers, checked first
    #[serde(default = "default_untrusted_prefixes")]
    pub untrusted_prefixes: Vec<String>,

    /// Id prefixes of trusted retailers
    #[serde(default = "default_trusted_prefixes")]
    pub trusted_prefixes: Vec<String>,

    /// Retailer display names treated as untrusted (case-insensitive)
    #[serde(default = "default_untrusted_retailers")]
    pub untrusted_retailers: Vec<String>,

    /// Label for ids and retailers that match nothing
    #[serde(default = "default_fallback")]
    pub fallback: TrustLevel,
}

fn default_untrusted_prefixes() -> Vec<String> {
    vec!["iot-".to_string()]
}

fn default_trusted_prefixes() -> Vec<String> {
    vec!["th-".to_string(), "gz-".to_string()]
}

fn default_untrusted_retailers() -> Vec<String> {
    vec!["iotmarket".to_string()]
}

fn default_fallback() -> TrustLevel {
    TrustLevel::Trusted
}

impl Default for TrustRules {
    fn default() -> Self {
        Self {
            untrusted_prefixes: default_untrusted_prefixes(),
            trusted_prefixes: default_trusted_prefixes(),
            untrusted_retailers: default_untrusted_retailers(),
            fallback: default_fallback(),
        }
    }
}

/// Classifier driven by id prefixes with a retailer-name fallback
#[derive(Debug, Clone, Default)]
pub struct PrefixClassifier {
    rules: TrustRules,
}

impl PrefixClassifier {
    pub fn new(rules: TrustRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &TrustRules {
        &self.rules
    }
}

impl TrustClassifier for PrefixClassifier {
    fn classify(&self, product_id: &str, retailer: &str) -> TrustLevel {
        let rules = &self.rules;

        if rules.untrusted_prefixes.iter().any(|p| product_id.starts_with(p.as_str())) {
            return TrustLevel::Untrusted;
        }

        if rules.trusted_prefixes.iter().any(|p| product_id.starts_with(p.as_str())) {
            return TrustLevel::Trusted;
        }

        let retailer = retailer.to_lowercase();
        if rules.untrusted_retailers.iter().any(|r| r.to_lowercase() == retailer) {
            return TrustLevel::Untrusted;
        }

        rules.fallback
    }
}

/// Classify with the default rule set
pub fn classify(product_id: &str, retailer: &str) -> TrustLevel {
    PrefixClassifier::default().classify(product_id, retailer)
}
