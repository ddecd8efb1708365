//! Lossless decimal numeric type backed by rust_decimal.
//!
//! All fixed-point ledger integers enter the decimal domain through
//! [`Decimal::from_base_units`], so every total is computed with the same
//! conversion and scale.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by ledger amounts (wei-style fixed point).
pub const LEDGER_DECIMALS: u32 = 18;

/// Decimals used by the score contract's borrowing power (USDC-style).
pub const BORROWING_POWER_DECIMALS: u32 = 6;

/// Lossless decimal numeric type for money.
///
/// Serializes to a JSON number and accepts JSON numbers on input, which is
/// what the receipt services return.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than {0} fractional digits")]
    TooPrecise(u32),
    #[error("amount does not fit the fixed-point range")]
    Overflow,
}

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Convert a fixed-point integer with `decimals` fractional digits.
    ///
    /// This is the only integer-to-decimal conversion in the crate. Values
    /// past the 96-bit decimal mantissa are an `Overflow`.
    pub fn from_base_units(units: U256, decimals: u32) -> Result<Self, AmountError> {
        let narrow = u128::try_from(units).map_err(|_| AmountError::Overflow)?;
        let signed = i128::try_from(narrow).map_err(|_| AmountError::Overflow)?;
        RustDecimal::try_from_i128_with_scale(signed, decimals)
            .map(|d| Decimal(d.normalize()))
            .map_err(|_| AmountError::Overflow)
    }

    /// Convert an 18-decimal ledger amount.
    pub fn from_wei(wei: U256) -> Result<Self, AmountError> {
        Self::from_base_units(wei, LEDGER_DECIMALS)
    }

    /// Inverse of [`Decimal::from_base_units`].
    pub fn to_base_units(&self, decimals: u32) -> Result<U256, AmountError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(AmountError::Negative);
        }
        if self.0.normalize().scale() > decimals {
            return Err(AmountError::TooPrecise(decimals));
        }
        let factor = RustDecimal::from_i128_with_scale(10i128.pow(decimals), 0);
        self.0
            .checked_mul(factor)
            .and_then(|scaled| scaled.trunc().to_u128())
            .map(U256::from)
            .ok_or(AmountError::Overflow)
    }

    pub fn to_wei(&self) -> Result<U256, AmountError> {
        self.to_base_units(LEDGER_DECIMALS)
    }

    /// Format without exponent notation and without trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Format with exactly two fractional digits.
    pub fn to_cents_string(&self) -> String {
        format!("{:.2}", self.round_cents().0)
    }

    /// Round half away from zero to two fractional digits.
    pub fn round_cents(&self) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn checked_div(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    fn wei(units: u128) -> U256 {
        U256::from(units)
    }

    #[test]
    fn test_from_wei_whole_amount() {
        let d = Decimal::from_wei(wei(25 * ONE_ETHER)).unwrap();
        assert_eq!(d.to_canonical_string(), "25");
    }

    #[test]
    fn test_from_wei_fractional_amount() {
        let d = Decimal::from_wei(wei(ONE_ETHER / 4)).unwrap();
        assert_eq!(d.to_canonical_string(), "0.25");
        let dust = Decimal::from_wei(wei(1)).unwrap();
        assert_eq!(dust.to_canonical_string(), "0.000000000000000001");
    }

    #[test]
    fn test_from_wei_overflow_is_error() {
        assert_eq!(Decimal::from_wei(wei(u128::MAX)), Err(AmountError::Overflow));
        assert_eq!(Decimal::from_wei(U256::MAX), Err(AmountError::Overflow));
    }

    #[test]
    fn test_borrowing_power_units() {
        let d = Decimal::from_base_units(wei(1_500_000), BORROWING_POWER_DECIMALS).unwrap();
        assert_eq!(d.to_canonical_string(), "1.5");
    }

    #[test]
    fn test_to_wei_inverts_from_wei() {
        let d = Decimal::from_str_canonical("43.09").unwrap();
        let units = d.to_wei().unwrap();
        assert_eq!(units, wei(43_090_000_000_000_000_000));
        assert_eq!(Decimal::from_wei(units).unwrap(), d);
    }

    #[test]
    fn test_to_wei_rejects_negative_and_precise() {
        let neg = Decimal::from_str_canonical("-1").unwrap();
        assert_eq!(neg.to_wei(), Err(AmountError::Negative));

        let precise = Decimal::from_str_canonical("0.0000000000000000001").unwrap();
        assert_eq!(precise.to_wei(), Err(AmountError::TooPrecise(18)));
    }

    #[test]
    fn test_cents_rounding() {
        let d = Decimal::from_str_canonical("10.005").unwrap();
        assert_eq!(d.to_cents_string(), "10.01");
        let d = Decimal::from_str_canonical("7").unwrap();
        assert_eq!(d.to_cents_string(), "7.00");
    }

    #[test]
    fn test_decimal_json_number() {
        let decimal = Decimal::from_str_canonical("123.456").unwrap();
        let json = serde_json::to_value(decimal).unwrap();
        assert!(json.is_number());

        let parsed: Decimal = serde_json::from_str("12.99").unwrap();
        assert_eq!(parsed, Decimal::from_str_canonical("12.99").unwrap());
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Decimal = Vec::<Decimal>::new().into_iter().sum();
        assert!(total.is_zero());
    }
}
