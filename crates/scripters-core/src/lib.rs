//! # scripters-core: Pure Domain Model for Scripters Shop
//!
//! Entity shapes, table declarations, lifecycle rules, validation and display
//! helpers for the storefront. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scripters Shop Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront / Admin (TypeScript)                 │   │
//! │  │      uses ts-rs bindings, format_price, truncate_address, cn    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ request documents                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ scripters-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ entities │ │  schema  │ │  types   │ │    validation    │  │   │
//! │  │   │ Row/New  │ │ TableDef │ │ statuses │ │ product/checkout │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────────┐                   │   │
//! │  │   │  money   │ │  format  │ │ class_names  │                   │   │
//! │  │   └──────────┘ └──────────┘ └──────────────┘                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 scripters-db (Database Layer)                   │   │
//! │  │         SQLite pool, migrations, drift check, repositories      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`entities`] - Row and insert shapes per table
//! - [`schema`] - Table declarations and the `Table` trait
//! - [`types`] - Enums, lifecycle gates, embedded records
//! - [`money`] - Integer money (cents) and crypto amounts
//! - [`validation`] - Request document validation
//! - [`format`] - Price, order number and address display
//! - [`class_names`] - Utility class merging
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **No I/O**: the database lives in `scripters-db`
//! 2. **Integer Money**: cents (and 1e-8 ETH), never floats
//! 3. **All Errors at Once**: validation reports every bad field
//!
//! ## Example Usage
//!
//! ```rust
//! use scripters_core::{OrderStatus, validation::validate_checkout};
//! use serde_json::json;
//!
//! let checkout = validate_checkout(&json!({
//!     "shippingAddress": {
//!         "name": "Ada", "address": "12 Main St", "city": "Austin",
//!         "state": "TX", "zip": "78701", "country": "US"
//!     }
//! }))
//! .unwrap();
//! assert_eq!(checkout.shipping_address.zip, "78701");
//!
//! assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
//! assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod class_names;
pub mod entities;
pub mod error;
pub mod format;
pub mod money;
pub mod schema;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use entities::*;
pub use error::{CoreError, CoreResult, FieldError, ValidationError};
pub use money::{CryptoAmount, CryptoCurrency, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart or order line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before they reach checkout.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Leading characters kept by [`format::truncate_address`] by default.
pub const DEFAULT_ADDRESS_CHARS: usize = 8;
