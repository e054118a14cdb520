//! # Display Helpers
//!
//! Stateless formatting used by presentation code: prices, order numbers and
//! wallet addresses.
//!
//! ```rust
//! use scripters_core::format::{format_price, truncate_address};
//!
//! assert_eq!(format_price(19.5).unwrap(), "$19.50");
//! assert_eq!(format_price("19.5").unwrap(), "$19.50");
//! assert_eq!(truncate_address("0x1234567890abcdef", 8), "0x123456...cdef");
//! ```

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// Length of the random order-number suffix.
pub const ORDER_SUFFIX_LEN: usize = 9;

const ORDER_SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static ORDER_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ORD-\d+-[0-9A-Z]{9}$").expect("valid order number pattern"));

// =============================================================================
// Prices
// =============================================================================

/// Anything that can be shown as a price.
///
/// `None` means the value is not a number.
pub trait PriceLike {
    fn to_price_decimal(&self) -> Option<Decimal>;
}

impl PriceLike for Decimal {
    fn to_price_decimal(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl PriceLike for Money {
    fn to_price_decimal(&self) -> Option<Decimal> {
        Some(self.to_decimal())
    }
}

impl PriceLike for f64 {
    /// Uses the shortest decimal that round-trips, so `0.1 + 0.2` shows as
    /// `$0.30` and `1.005` as `$1.01`.
    fn to_price_decimal(&self) -> Option<Decimal> {
        if !self.is_finite() {
            return None;
        }
        parse_decimal(&self.to_string())
    }
}

impl PriceLike for f32 {
    fn to_price_decimal(&self) -> Option<Decimal> {
        if !self.is_finite() {
            return None;
        }
        parse_decimal(&self.to_string())
    }
}

impl PriceLike for i64 {
    fn to_price_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl PriceLike for i32 {
    fn to_price_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl PriceLike for u32 {
    fn to_price_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl PriceLike for str {
    /// Surrounding whitespace is ignored; a blank string is zero.
    fn to_price_decimal(&self) -> Option<Decimal> {
        let s = self.trim();
        if s.is_empty() {
            return Some(Decimal::ZERO);
        }
        parse_decimal(s)
    }
}

impl PriceLike for String {
    fn to_price_decimal(&self) -> Option<Decimal> {
        self.as_str().to_price_decimal()
    }
}

impl<T: PriceLike + ?Sized> PriceLike for &T {
    fn to_price_decimal(&self) -> Option<Decimal> {
        (**self).to_price_decimal()
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Formats a price as US dollars with two decimals and thousands grouping.
///
/// Rounds half away from zero. Input that is not a number fails on field
/// `price`.
///
/// ## Example
/// ```rust
/// use scripters_core::format::format_price;
///
/// assert_eq!(format_price(1234.5).unwrap(), "$1,234.50");
/// assert_eq!(format_price(-5).unwrap(), "-$5.00");
/// assert!(format_price("abc").is_err());
/// ```
pub fn format_price<P: PriceLike>(price: P) -> ValidationResult<String> {
    let amount = price
        .to_price_decimal()
        .ok_or_else(|| ValidationError::single("price", "Invalid price"))?;

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let money = Money::from_decimal(rounded)
        .ok_or_else(|| ValidationError::single("price", "Price is out of range"))?;

    Ok(money.to_string())
}

// =============================================================================
// Order Numbers
// =============================================================================

/// `ORD-<unix millis>-<9 chars of 0-9A-Z>`.
///
/// Uniqueness is probabilistic; the store's UNIQUE constraint on
/// `orders.order_number` is the backstop.
pub fn generate_order_number() -> String {
    order_number_at(Utc::now(), &mut rand::thread_rng())
}

/// Order number for a given instant and random source.
pub fn order_number_at<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_SUFFIX_CHARSET.len());
            ORDER_SUFFIX_CHARSET[idx] as char
        })
        .collect();
    format!("ORD-{}-{}", now.timestamp_millis(), suffix)
}

/// Whether `s` has the shape of a generated order number.
pub fn is_order_number(s: &str) -> bool {
    ORDER_NUMBER_RE.is_match(s)
}

// =============================================================================
// Wallet Addresses
// =============================================================================

/// First `chars` characters, `...`, then the last four.
///
/// Character based and total: short inputs are never rejected, they just
/// overlap.
///
/// ## Example
/// ```rust
/// use scripters_core::format::truncate_address;
/// use scripters_core::DEFAULT_ADDRESS_CHARS;
///
/// let addr = "0x52908400098527886E0F7030069857D2E4169EE7";
/// assert_eq!(truncate_address(addr, DEFAULT_ADDRESS_CHARS), "0x529084...9EE7");
/// ```
pub fn truncate_address(address: &str, chars: usize) -> String {
    let all: Vec<char> = address.chars().collect();
    let head: String = all.iter().take(chars).collect();
    let tail: String = all[all.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

// =============================================================================
// Unit Tests
// =============================================================================
