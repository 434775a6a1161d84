use crate::domain::pricing::PricingPolicy;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CARRIER: &str = "Aramex";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingSettings {
    /// Carrier used when the seller does not name one.
    pub default_carrier: String,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            default_carrier: DEFAULT_CARRIER.to_string(),
        }
    }
}

/// Ledger settings, read from an optional TOML file.
///
/// ```toml
/// [pricing]
/// base_shipping = "15.00"
/// protection_rate = "0.05"
/// protection_flat = "2.50"
///
/// [shipping]
/// default_carrier = "Aramex"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub pricing: PricingPolicy,
    pub shipping: ShippingSettings,
}

impl LedgerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LedgerError::Config(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pricing.validate()?;
        if self.shipping.default_carrier.trim().is_empty() {
            return Err(LedgerError::Config(
                "shipping.default_carrier must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
