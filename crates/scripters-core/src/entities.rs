//! # Entity Shapes
//!
//! Read shape (row) and write shape (insert) for every table.
//!
//! ## Row vs Insert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product (row)                   NewProduct (insert)                    │
//! │  ─────────────                   ───────────────────                    │
//! │  id            ◄── generated ──  (none)                                 │
//! │  name, slug, price_cents ... ◄── name, slug, price ...                  │
//! │  status        ◄── default  ──   status (defaults to Draft)             │
//! │  created_at    ◄── store now ──  (none)                                 │
//! │  updated_at    ◄── store now ──  (none)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns are kept as integer minor units on rows, with accessors
//! returning [`Money`] / [`CryptoAmount`]. JSON columns (`tags`, `images`,
//! `permissions`, `items`, `shipping_address`) are typed records, not open
//! documents.
//!
//! The pairing of each row with its insert shape is declared by
//! [`crate::schema::Table`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::{CryptoAmount, CryptoCurrency, Money};
use crate::types::{
    AdminRole, CartItem, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, ProductLicense,
    ProductStatus, ShippingAddress, UserRole,
};

/// Fresh primary key for a UUID-keyed table.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// User
// =============================================================================

/// A storefront account (customer, admin or vendor).
///
/// `id` is the immutable identity. `wallet_address` can be linked once and
/// is then immutable as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
}

// =============================================================================
// Admin User
// =============================================================================

/// A back-office wallet and what it may do.
///
/// `permissions` is an open list (`"products:write"`, `"orders:refund"`, ...);
/// authorization decisions are made outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminUser {
    pub wallet_address: String,
    pub role: AdminRole,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub permissions: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
}

impl AdminUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role == AdminRole::SuperAdmin || self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewAdminUser {
    pub wallet_address: String,
    pub role: AdminRole,
    pub permissions: Vec<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// URL key, unique across the catalog.
    pub slug: String,
    pub description: Option<String>,
    /// Fiat price in cents.
    pub price_cents: i64,
    /// ETH price in 1e-8 ETH.
    pub price_eth_units: Option<i64>,
    /// USDC price in cents.
    pub price_usdc_cents: Option<i64>,
    pub inventory: i64,
    pub category: String,
    pub status: ProductStatus,
    pub license: Option<ProductLicense>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub images: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn price_eth(&self) -> Option<CryptoAmount> {
        self.price_eth_units
            .map(|units| CryptoAmount::from_units(units, CryptoCurrency::Eth))
    }

    pub fn price_usdc(&self) -> Option<CryptoAmount> {
        self.price_usdc_cents
            .map(|units| CryptoAmount::from_units(units, CryptoCurrency::Usdc))
    }

    /// Price in the given crypto currency, if one is listed.
    pub fn crypto_price(&self, currency: CryptoCurrency) -> Option<CryptoAmount> {
        match currency {
            CryptoCurrency::Eth => self.price_eth(),
            CryptoCurrency::Usdc => self.price_usdc(),
        }
    }

    pub fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// Purchasable right now for the given quantity.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.status == ProductStatus::Active && self.inventory >= quantity
    }

    /// Whole percent off `list_price`, rounded half up.
    ///
    /// `None` unless the current price is below a positive list price.
    pub fn discount_percentage(&self, list_price: Money) -> Option<u8> {
        let list = list_price.cents();
        if list <= 0 || self.price_cents >= list || self.price_cents < 0 {
            return None;
        }
        let off = i128::from(list - self.price_cents) * 100;
        let list = i128::from(list);
        u8::try_from((off + list / 2) / list).ok()
    }
}

/// Storefront read model: a product plus the fields derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWithDetails {
    #[serde(flatten)]
    pub product: Product,
    pub in_stock: bool,
    pub discount_percentage: Option<u8>,
}

impl ProductWithDetails {
    /// `list_price` is the undiscounted price, when the product is on sale.
    pub fn new(product: Product, list_price: Option<Money>) -> Self {
        let discount_percentage = list_price.and_then(|list| product.discount_percentage(list));
        ProductWithDetails {
            in_stock: product.in_stock(),
            discount_percentage,
            product,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub price_eth: Option<CryptoAmount>,
    pub price_usdc: Option<CryptoAmount>,
    pub inventory: i64,
    pub category: String,
    pub status: ProductStatus,
    pub license: Option<ProductLicense>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

impl NewProduct {
    /// Minimal draft product; everything optional left empty.
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        price: Money,
        inventory: i64,
        category: impl Into<String>,
    ) -> Self {
        NewProduct {
            name: name.into(),
            slug: slug.into(),
            description: None,
            price,
            price_eth: None,
            price_usdc: None,
            inventory,
            category: category.into(),
            status: ProductStatus::default(),
            license: None,
            file_url: None,
            file_type: None,
            tags: Vec::new(),
            images: Vec::new(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-facing number, `ORD-<millis>-<suffix>`.
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// Card payment intent reference.
    pub payment_intent_id: Option<String>,
    pub currency: Option<CryptoCurrency>,
    pub total_crypto_units: Option<i64>,
    pub tx_hash: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub shipping_address: ShippingAddress,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: Money::from_cents(self.subtotal_cents),
            tax: Money::from_cents(self.tax_cents),
            shipping: Money::from_cents(self.shipping_cents),
            total: Money::from_cents(self.total_cents),
        }
    }

    pub fn total_crypto(&self) -> Option<CryptoAmount> {
        match (self.total_crypto_units, self.currency) {
            (Some(units), Some(currency)) => Some(CryptoAmount::from_units(units, currency)),
            _ => None,
        }
    }
}

/// Write shape for an order. Items are inserted alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: String,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
    /// Expected crypto total for crypto checkouts.
    pub total_crypto: Option<CryptoAmount>,
    pub shipping_address: ShippingAddress,
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order.
///
/// `product_name` and `unit_price_cents` are snapshots taken when the order
/// was placed; later product edits never change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    /// Snapshots a product's current name and price.
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        NewOrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price(),
        }
    }

    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart owned by a user or an anonymous session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub items: Vec<CartItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Who a new cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CartOwner {
    User(String),
    Session(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCart {
    pub owner: CartOwner,
    pub items: Vec<CartItem>,
}

// =============================================================================
// Download
// =============================================================================

/// A download grant for a purchased digital product.
///
/// `expires_at` is advisory: callers decide whether to honour it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Download {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub user_id: String,
    pub download_url: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub download_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Download {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDownload {
    pub order_id: String,
    pub product_id: String,
    pub user_id: String,
    pub download_url: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
