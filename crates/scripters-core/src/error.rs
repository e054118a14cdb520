//! # Error Types
//!
//! Domain-specific error types for scripters-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scripters-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Every (field, message) pair of a bad input     │
//! │                                                                         │
//! │  scripters-db errors (separate crate)                                  │
//! │  └── DbError          - Store errors, passed through unmodified        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Validation never stops at the first failure: one error carries them all
//! 3. Messages are human readable and returned to the caller verbatim

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough inventory to fill an order line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Decrement inventory: available=3
    ///      │
    ///      ▼
    /// InsufficientInventory { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole order is rolled back
    /// ```
    #[error("Insufficient inventory for {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Product is not active and cannot be ordered.
    #[error("Product {product_id} is not available for sale")]
    ProductUnavailable { product_id: String },

    /// A status change that would move a lifecycle backwards or out of a
    /// terminal state.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// `total != subtotal + tax + shipping`.
    #[error("Order total {actual} does not match subtotal + tax + shipping ({expected})")]
    TotalMismatch { expected: Money, actual: Money },

    /// Order subtotal differs from the sum of its line items.
    #[error("Order subtotal {actual} does not match its items ({expected})")]
    SubtotalMismatch { expected: Money, actual: Money },

    /// An order must contain at least one line.
    #[error("Order has no items")]
    EmptyOrder,

    /// Amount carries more fractional digits than its currency allows.
    #[error("{currency} amounts allow at most {scale} decimal places")]
    PrecisionExceeded { currency: String, scale: u32 },

    /// Amount does not fit the stored integer units, or a sum or product
    /// of amounts overflowed.
    #[error("Amount is out of range")]
    AmountOutOfRange,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// One violated rule on one input field.
///
/// `field` is the key path inside the input document, dotted for nested
/// objects (`shippingAddress.zip`). The empty string names the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Input validation failure.
///
/// Always holds at least one [`FieldError`], in the order the fields were
/// checked. Validation is terminal for the request: there is no partial
/// acceptance and nothing to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[error("{}", summary(.errors))]
#[ts(export)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.field.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.field, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Builds an error from collected field errors.
    ///
    /// Returns `None` when nothing was collected, so an empty
    /// `ValidationError` can never exist.
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(ValidationError { errors })
        }
    }

    /// Error for a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// All violations, in check order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether any violation names `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages reported for `field`.
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Field-keyed error map, the shape handed back to callers.
    ///
    /// ## Example
    /// ```rust
    /// use scripters_core::ValidationError;
    ///
    /// let err = ValidationError::single("slug", "Slug is required");
    /// let map = err.to_map();
    /// assert_eq!(map["slug"], vec!["Slug is required".to_string()]);
    /// ```
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for e in &self.errors {
            map.entry(e.field.clone()).or_default().push(e.message.clone());
        }
        map
    }

    /// Appends the violations of `other`.
    pub fn merge(mut self, other: ValidationError) -> Self {
        self.errors.extend(other.errors);
        self
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
