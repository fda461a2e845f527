//! Cart configuration.

use crate::CartError;
use serde::{Deserialize, Serialize};

/// How an item's price is treated when the same item is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaddPricing {
    /// Keep the price stored on the first add; extra units are priced at it.
    #[default]
    Original,
    /// Re-price the whole line at the most recently supplied price.
    Latest,
}

/// Settings for a [`crate::CartManager`].
///
/// # Example
///
/// ```toml
/// session_key = "shoppingcart"
/// item_key_prefix = "opt"
/// readd_pricing = "original"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Top-level session key holding the cart record.
    pub session_key: String,
    /// Prefix joined to an item ID to form its key in `items`.
    pub item_key_prefix: String,
    /// Price handling on re-add.
    pub readd_pricing: ReaddPricing,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            session_key: "shoppingcart".to_string(),
            item_key_prefix: "opt".to_string(),
            readd_pricing: ReaddPricing::Original,
        }
    }
}

impl CartConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, CartError> {
        let config: Self = toml::from_str(s).map_err(|e| CartError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the session key.
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// Set the item key prefix.
    pub fn with_item_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.item_key_prefix = prefix.into();
        self
    }

    /// Set the re-add pricing policy.
    pub fn with_readd_pricing(mut self, pricing: ReaddPricing) -> Self {
        self.readd_pricing = pricing;
        self
    }

    /// Check that the keys can be used as session paths.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.session_key.is_empty() {
            return Err(CartError::Config("session_key must not be empty".to_string()));
        }
        if self.session_key.contains('.') {
            return Err(CartError::Config(format!(
                "session_key must be a single path segment: {:?}",
                self.session_key
            )));
        }
        if self.item_key_prefix.contains('.') {
            return Err(CartError::Config(format!(
                "item_key_prefix must not contain '.': {:?}",
                self.item_key_prefix
            )));
        }
        Ok(())
    }
}
