use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO currency codes accepted on listings and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Aed,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Aed => f.write_str("AED"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

pub(crate) fn out_of_range() -> LedgerError {
    LedgerError::ValidationError("Amount out of range".to_string())
}

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so prices, fees and ledger amounts never touch binary
/// floating point. Deserialization goes through [`Amount::new`], so negative values are
/// rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(pub(crate) Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            Err(LedgerError::ValidationError(
                "Amount must not be negative".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }

    /// Like [`Amount::new`] but also rejects zero.
    pub fn positive(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Fails with `ValidationError` instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    /// Rounds to whole fils/cents, halves away from zero.
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0)).is_ok());
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(LedgerError::ValidationError(_))
        ));
        assert!(matches!(
            Amount::positive(dec!(0.0)),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::new(dec!(10.25)).unwrap();
        let b = Amount::new(dec!(4.75)).unwrap();
        assert_eq!(a.checked_add(b).unwrap().value(), dec!(15.00));

        let max = Amount::new(Decimal::MAX).unwrap();
        assert!(matches!(
            max.checked_add(a),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_round_cents_midpoint() {
        let a = Amount::new(dec!(2.125)).unwrap();
        assert_eq!(a.round_cents().value(), dec!(2.13));
        let b = Amount::new(dec!(7.5)).unwrap();
        assert_eq!(b.round_cents().value(), dec!(7.50));
    }

    #[test]
    fn test_amount_rejects_negative_on_deserialize() {
        let parsed: std::result::Result<Amount, _> = serde_json::from_str("\"-3.00\"");
        assert!(parsed.is_err());
        let parsed: Amount = serde_json::from_str("\"3.00\"").unwrap();
        assert_eq!(parsed.value(), dec!(3.00));
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(serde_json::to_string(&Currency::Aed).unwrap(), "\"AED\"");
        assert_eq!(Currency::Usd.to_string(), "USD");
    }
}
