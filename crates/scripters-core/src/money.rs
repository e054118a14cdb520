//! # Money Module
//!
//! Monetary values for the storefront.
//!
//! ## Why Integer Minor Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004  ❌                                    │
//! │                                                                         │
//! │  OUR SOLUTION: integers in the smallest unit of each currency           │
//! │                                                                         │
//! │    Currency   Scale   Stored as                                         │
//! │    USD        2       cents            (Money)                          │
//! │    USDC       2       cents            (CryptoAmount)                   │
//! │    ETH        8       1e-8 ETH units   (CryptoAmount)                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decimal input (prices typed by an admin, JSON numbers) enters through
//! `rust_decimal` and is converted exactly once, here.
//!
//! ## Usage
//! ```rust
//! use scripters_core::money::Money;
//!
//! let price = Money::from_cents(1999);
//! let line = price.multiply_quantity(3).unwrap();
//! assert_eq!(line.to_string(), "$59.97");
//! ```
//!
//! Arithmetic is checked: an overflowing sum or product is
//! [`CoreError::AmountOutOfRange`], never a wrapped value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type (USD)
// =============================================================================

/// A USD amount in cents.
///
/// Signed so refunds and adjustments can be expressed; columns that must
/// not go negative carry their own `CHECK` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use scripters_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal dollar amount, rounding half away from zero to
    /// whole cents.
    ///
    /// Returns `None` if the amount does not fit in `i64` cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use scripters_core::money::Money;
    ///
    /// let d: Decimal = "19.995".parse().unwrap();
    /// assert_eq!(Money::from_decimal(d).unwrap().cents(), 2000);
    /// ```
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money)
    }

    /// Returns the amount as a decimal in dollars.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use scripters_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_err());
    /// ```
    pub fn multiply_quantity(&self, qty: i64) -> CoreResult<Self> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or(CoreError::AmountOutOfRange)
    }

    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, failing instead of overflowing.
    pub fn try_sum(amounts: impl IntoIterator<Item = Money>) -> CoreResult<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), Money::checked_add)
            .ok_or(CoreError::AmountOutOfRange)
    }
}

/// `$1,234.50`, `-$5.00`: en-US currency layout with thousands grouping.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let dollars = (self.0 / 100).unsigned_abs().to_string();

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}.{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Crypto Currencies
// =============================================================================

/// Cryptocurrencies accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum CryptoCurrency {
    Eth,
    Usdc,
}

impl CryptoCurrency {
    /// Decimal places stored for this currency.
    pub const fn scale(&self) -> u32 {
        match self {
            CryptoCurrency::Eth => 8,
            CryptoCurrency::Usdc => 2,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            CryptoCurrency::Eth => "ETH",
            CryptoCurrency::Usdc => "USDC",
        }
    }
}

impl fmt::Display for CryptoCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Crypto Amount
// =============================================================================

/// An amount of a cryptocurrency in its smallest stored unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CryptoAmount {
    units: i64,
    currency: CryptoCurrency,
}

impl CryptoAmount {
    #[inline]
    pub const fn from_units(units: i64, currency: CryptoCurrency) -> Self {
        CryptoAmount { units, currency }
    }

    /// Converts an exact decimal amount.
    ///
    /// Unlike [`Money::from_decimal`] this never rounds: an amount with more
    /// fractional digits than the currency stores is rejected.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use scripters_core::money::{CryptoAmount, CryptoCurrency};
    ///
    /// let eth: Decimal = "0.05".parse().unwrap();
    /// let amount = CryptoAmount::from_decimal(eth, CryptoCurrency::Eth).unwrap();
    /// assert_eq!(amount.units(), 5_000_000);
    ///
    /// let too_fine: Decimal = "0.001".parse().unwrap();
    /// assert!(CryptoAmount::from_decimal(too_fine, CryptoCurrency::Usdc).is_err());
    /// ```
    pub fn from_decimal(amount: Decimal, currency: CryptoCurrency) -> CoreResult<Self> {
        let scale = currency.scale();
        let normalized = amount.normalize();
        if normalized.scale() > scale {
            return Err(CoreError::PrecisionExceeded {
                currency: currency.code().to_string(),
                scale,
            });
        }

        let factor = Decimal::from(10_i64.pow(scale));
        let units = normalized
            .checked_mul(factor)
            .and_then(|u| u.to_i64())
            .ok_or(CoreError::AmountOutOfRange)?;

        Ok(CryptoAmount { units, currency })
    }

    #[inline]
    pub const fn units(&self) -> i64 {
        self.units
    }

    #[inline]
    pub const fn currency(&self) -> CryptoCurrency {
        self.currency
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.units, self.currency.scale())
    }
}

/// `0.05000000 ETH`
impl fmt::Display for CryptoAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(123_450).to_string(), "$1,234.50");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "$1,000,000.00");
        assert_eq!(Money::from_cents(-99_999_999).to_string(), "-$999,999.99");
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(19.5)).unwrap().cents(), 1950);
        assert_eq!(Money::from_decimal(dec!(0.005)).unwrap().cents(), 1);
        assert_eq!(Money::from_decimal(dec!(0.004)).unwrap().cents(), 0);
        assert_eq!(Money::from_decimal(dec!(-0.005)).unwrap().cents(), -1);
    }

    #[test]
    fn test_decimal_round_trip() {
        let money = Money::from_cents(1999);
        assert_eq!(money.to_decimal(), dec!(19.99));
    }

    #[test]
    fn test_from_decimal_out_of_range() {
        assert!(Money::from_decimal(Decimal::MAX).is_none());
        assert!(Money::from_decimal(dec!(50000000000000000000000000000)).is_none());
        // largest whole-cent amount that still fits
        assert_eq!(
            Money::from_decimal(dec!(92233720368547758.07)).unwrap().cents(),
            i64::MAX
        );
        assert!(Money::from_decimal(dec!(92233720368547758.08)).is_none());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a.checked_add(b).unwrap().cents(), 1500);
        assert_eq!(a.checked_sub(b).unwrap().cents(), 500);
        assert_eq!(a.multiply_quantity(3).unwrap().cents(), 3000);
        assert_eq!(Money::try_sum([a, b, b]).unwrap().cents(), 2000);
        assert_eq!(Money::try_sum([]).unwrap(), Money::zero());
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        let max = Money::from_cents(i64::MAX);
        assert!(max.checked_add(Money::from_cents(1)).is_none());
        assert!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)).is_none());
        assert!(matches!(
            Money::from_cents(10_000).multiply_quantity(i64::MAX),
            Err(CoreError::AmountOutOfRange)
        ));
        assert!(matches!(
            Money::try_sum([max, Money::from_cents(1)]),
            Err(CoreError::AmountOutOfRange)
        ));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_crypto_scales() {
        assert_eq!(CryptoCurrency::Eth.scale(), 8);
        assert_eq!(CryptoCurrency::Usdc.scale(), 2);
    }

    #[test]
    fn test_crypto_amount_exact_conversion() {
        let eth = CryptoAmount::from_decimal(dec!(1.23456789), CryptoCurrency::Eth).unwrap();
        assert_eq!(eth.units(), 123_456_789);
        assert_eq!(eth.to_decimal(), dec!(1.23456789));

        let usdc = CryptoAmount::from_decimal(dec!(19.50), CryptoCurrency::Usdc).unwrap();
        assert_eq!(usdc.units(), 1950);
    }

    #[test]
    fn test_crypto_amount_rejects_excess_precision() {
        let err = CryptoAmount::from_decimal(dec!(0.000000001), CryptoCurrency::Eth).unwrap_err();
        assert!(matches!(err, CoreError::PrecisionExceeded { scale: 8, .. }));

        // Trailing zeros are not extra precision.
        assert!(CryptoAmount::from_decimal(dec!(1.2300), CryptoCurrency::Usdc).is_ok());
    }

    #[test]
    fn test_crypto_amount_out_of_range() {
        let huge = dec!(1000000000000000000000000000);
        assert!(matches!(
            CryptoAmount::from_decimal(huge, CryptoCurrency::Eth),
            Err(CoreError::AmountOutOfRange)
        ));
        assert!(matches!(
            CryptoAmount::from_decimal(Decimal::MAX, CryptoCurrency::Usdc),
            Err(CoreError::AmountOutOfRange)
        ));
        // fits in i64 as a decimal but not once scaled to 1e-8 units
        assert!(matches!(
            CryptoAmount::from_decimal(dec!(100000000000), CryptoCurrency::Eth),
            Err(CoreError::AmountOutOfRange)
        ));
    }

    #[test]
    fn test_crypto_display() {
        let amount = CryptoAmount::from_units(5_000_000, CryptoCurrency::Eth);
        assert_eq!(amount.to_string(), "0.05000000 ETH");
    }
}
