//! # Domain Types
//!
//! Enums and embedded value records shared by the entity shapes.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Closed enums (CHECK constrained columns)                              │
//! │  ├── UserRole        customer | admin | vendor                          │
//! │  ├── AdminRole       super_admin | admin | moderator                    │
//! │  ├── ProductStatus   draft | active | archived                          │
//! │  ├── ProductLicense  single | unlimited | commercial                    │
//! │  ├── OrderStatus     pending → processing → shipped → delivered        │
//! │  │                        └──────────┴──► cancelled                     │
//! │  ├── PaymentStatus   pending → confirmed → completed                    │
//! │  │                               └───────────┴──► refunded              │
//! │  └── PaymentMethod   card | crypto                                      │
//! │                                                                         │
//! │  JSON value records (stored in TEXT columns)                           │
//! │  ├── ShippingAddress                                                   │
//! │  └── CartItem                                                          │
//! │                                                                         │
//! │  OrderTotals: total = subtotal + tax + shipping                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Roles
// =============================================================================

/// Role of a storefront account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
    Vendor,
}

/// Role of a back-office wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Moderator,
}

// =============================================================================
// Product Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductStatus {
    /// Being edited; hidden from the catalog.
    #[default]
    Draft,
    /// Listed and purchasable.
    Active,
    /// Retired; kept for order history.
    Archived,
}

/// Usage terms sold with a digital product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductLicense {
    Single,
    Unlimited,
    Commercial,
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment lifecycle of an order.
///
/// ## Transition Rules
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │             │
///    └─────────────┴──────► cancelled
/// ```
/// Moves are forward only; skipping ahead is allowed. `delivered` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Pending | OrderStatus::Processing, OrderStatus::Cancelled) => true,
            (_, OrderStatus::Cancelled) => false,
            (current, next) => !current.is_terminal() && next.rank() > current.rank(),
        }
    }

    /// Like [`can_transition_to`](Self::can_transition_to), as a `Result`.
    pub fn ensure_transition(&self, next: OrderStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "Order",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement lifecycle of an order's payment.
///
/// ## Transition Rules
/// ```text
/// pending ──► confirmed ──► completed
///                 │             │
///                 └─────────────┴──► refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    /// Awaiting payment (card intent created or tx broadcast).
    #[default]
    Pending,
    /// Payment seen (intent succeeded or tx mined).
    Confirmed,
    /// Payment settled and goods released.
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::Confirmed => 1,
            PaymentStatus::Completed => 2,
            PaymentStatus::Refunded => 3,
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match (self, next) {
            (PaymentStatus::Confirmed | PaymentStatus::Completed, PaymentStatus::Refunded) => true,
            (_, PaymentStatus::Refunded) => false,
            (PaymentStatus::Refunded, _) => false,
            (current, next) => next.rank() > current.rank(),
        }
    }

    pub fn ensure_transition(&self, next: PaymentStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "Payment",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Card payment through a payment intent.
    Card,
    /// On-chain transfer in ETH or USDC.
    Crypto,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Crypto => "crypto",
        })
    }
}

// =============================================================================
// Shipping Address
// =============================================================================

/// Structured shipping address, stored as a JSON document on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShippingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

// =============================================================================
// Cart Item
// =============================================================================

/// One line of a cart's embedded item list.
///
/// Carts hold product ids, not joins: a line survives price edits and is
/// priced only when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Order Totals
// =============================================================================

/// The four monetary figures of an order.
///
/// Built through [`OrderTotals::new`], `total` is always
/// `subtotal + tax + shipping`. Totals that arrive from elsewhere are
/// checked with [`OrderTotals::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// ## Example
    /// ```rust
    /// use scripters_core::{Money, OrderTotals};
    ///
    /// let totals = OrderTotals::new(
    ///     Money::from_cents(5000),
    ///     Money::from_cents(413),
    ///     Money::from_cents(599),
    /// )?;
    /// assert_eq!(totals.total.cents(), 6012);
    /// # Ok::<(), scripters_core::CoreError>(())
    /// ```
    pub fn new(subtotal: Money, tax: Money, shipping: Money) -> CoreResult<Self> {
        Ok(OrderTotals {
            subtotal,
            tax,
            shipping,
            total: Money::try_sum([subtotal, tax, shipping])?,
        })
    }

    pub fn verify(&self) -> CoreResult<()> {
        let expected = Money::try_sum([self.subtotal, self.tax, self.shipping])?;
        if expected != self.total {
            return Err(CoreError::TotalMismatch {
                expected,
                actual: self.total,
            });
        }
        Ok(())
    }

    /// Checks the subtotal against the sum of the order's line totals.
    pub fn verify_subtotal(&self, line_totals: impl IntoIterator<Item = Money>) -> CoreResult<()> {
        let expected = Money::try_sum(line_totals)?;
        if expected != self.subtotal {
            return Err(CoreError::SubtotalMismatch {
                expected,
                actual: self.subtotal,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
