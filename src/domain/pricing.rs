use super::money::{Amount, out_of_range};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rates used to price a new order.
///
/// Only consulted at order creation. Stored orders keep the figures they were created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Shipping cost charged when the buyer does not supply one.
    pub base_shipping: Decimal,
    /// Proportional part of the buyer protection fee.
    pub protection_rate: Decimal,
    /// Flat part of the buyer protection fee.
    pub protection_flat: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_shipping: dec!(15.00),
            protection_rate: dec!(0.05),
            protection_flat: dec!(2.50),
        }
    }
}

/// The monetary breakdown frozen onto an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub item_price: Amount,
    pub shipping_cost: Amount,
    pub buyer_protection_fee: Amount,
    pub total_price: Amount,
}

impl PricingPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.base_shipping.is_sign_negative() && !self.base_shipping.is_zero() {
            return Err(LedgerError::Config(
                "pricing.base_shipping must not be negative".to_string(),
            ));
        }
        if self.protection_rate < Decimal::ZERO || self.protection_rate >= Decimal::ONE {
            return Err(LedgerError::Config(
                "pricing.protection_rate must be in [0, 1)".to_string(),
            ));
        }
        if self.protection_flat.is_sign_negative() && !self.protection_flat.is_zero() {
            return Err(LedgerError::Config(
                "pricing.protection_flat must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn protection_fee(&self, item_price: Amount) -> Result<Amount> {
        item_price
            .value()
            .checked_mul(self.protection_rate)
            .and_then(|fee| fee.checked_add(self.protection_flat))
            .map(|fee| Amount(fee).round_cents())
            .ok_or_else(out_of_range)
    }

    /// Prices an order for `item_price`, falling back to the base shipping rate.
    pub fn quote(
        &self,
        item_price: Decimal,
        shipping_cost: Option<Decimal>,
    ) -> Result<PriceBreakdown> {
        let item_price = Amount::positive(item_price).map_err(|_| {
            LedgerError::ValidationError("Item price must be positive".to_string())
        })?;
        let shipping_cost = Amount::new(shipping_cost.unwrap_or(self.base_shipping)).map_err(|_| {
            LedgerError::ValidationError("Shipping cost must not be negative".to_string())
        })?;
        let buyer_protection_fee = self.protection_fee(item_price)?;
        let total_price = item_price
            .checked_add(shipping_cost)?
            .checked_add(buyer_protection_fee)?;

        Ok(PriceBreakdown {
            item_price,
            shipping_cost,
            buyer_protection_fee,
            total_price,
        })
    }
}

impl PriceBreakdown {
    /// What the seller receives on completion. The protection fee stays with the platform.
    pub fn payout(&self) -> Result<Amount> {
        self.item_price.checked_add(self.shipping_cost)
    }
}
