//! # Validation Module
//!
//! The boundary where untyped request documents become typed inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request document (serde_json::Value)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Every field checked, every violation collected                     │
//! │  └── Ok(typed input) or Err(ValidationError { field, message }*)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE constraints (slug, order_number, ...)                       │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field keys are the document's own (camelCase) keys, dotted for nested
//! objects. Lengths are counted in characters and strings are not trimmed.
//!
//! ## Usage
//! ```rust
//! use scripters_core::validation::validate_product;
//! use serde_json::json;
//!
//! let err = validate_product(&json!({ "name": "ab", "price": 0 })).unwrap_err();
//! assert!(err.has_field("name"));
//! assert!(err.has_field("slug"));
//! assert!(err.has_field("price"));
//! ```

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::entities::NewProduct;
use crate::error::{FieldError, ValidationError};
use crate::money::Money;
use crate::types::ShippingAddress;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip pattern"));

static WALLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid wallet pattern"));

static TX_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("valid tx hash pattern"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Field Collector
// =============================================================================

/// Walks one JSON object and collects every violation.
struct Fields<'a> {
    object: Option<&'a Map<String, Value>>,
    prefix: String,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn root(input: &'a Value) -> Self {
        let mut fields = Fields {
            object: input.as_object(),
            prefix: String::new(),
            errors: Vec::new(),
        };
        if fields.object.is_none() {
            fields.fail("", "Expected object");
        }
        fields
    }

    fn key(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        let key = self.key(field);
        self.errors.push(FieldError::new(key, message));
    }

    /// Present, non-null value. Missing or null records "Required".
    fn required(&mut self, field: &str) -> Option<&'a Value> {
        let object = self.object?;
        match object.get(field) {
            Some(Value::Null) | None => {
                self.fail(field, "Required");
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str) -> Option<&'a str> {
        let value = self.required(field)?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.fail(field, "Expected string");
                None
            }
        }
    }

    /// String of at least `min` characters.
    fn string_min(&mut self, field: &str, min: usize, message: &str) -> Option<&'a str> {
        let s = self.string(field)?;
        if s.chars().count() < min {
            self.fail(field, message);
            return None;
        }
        Some(s)
    }

    fn optional_string(&mut self, field: &str) -> Option<Option<&'a str>> {
        let object = self.object?;
        match object.get(field) {
            Some(Value::Null) | None => Some(None),
            Some(Value::String(s)) => Some(Some(s.as_str())),
            Some(_) => {
                self.fail(field, "Expected string");
                None
            }
        }
    }

    fn number(&mut self, field: &str) -> Option<&'a serde_json::Number> {
        let value = self.required(field)?;
        match value {
            Value::Number(n) => Some(n),
            _ => {
                self.fail(field, "Expected number");
                None
            }
        }
    }

    fn decimal(&mut self, field: &str) -> Option<Decimal> {
        let n = self.number(field)?;
        match number_to_decimal(n) {
            Some(d) => Some(d),
            None => {
                self.fail(field, "Number is out of range");
                None
            }
        }
    }

    fn whole_number(&mut self, field: &str, message: &str) -> Option<i64> {
        let n = self.number(field)?;
        let whole = n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        });
        if whole.is_none() {
            self.fail(field, message);
        }
        whole
    }

    /// Descends into a nested object; violations inside use dotted keys.
    fn object(&mut self, field: &str) -> Option<Fields<'a>> {
        let value = self.required(field)?;
        match value.as_object() {
            Some(object) => Some(Fields {
                object: Some(object),
                prefix: self.key(field),
                errors: Vec::new(),
            }),
            None => {
                self.fail(field, "Expected object");
                None
            }
        }
    }

    fn absorb(&mut self, nested: Fields<'_>) {
        self.errors.extend(nested.errors);
    }

    fn finish<T>(self, value: Option<T>) -> ValidationResult<T> {
        match (ValidationError::from_errors(self.errors), value) {
            (Some(err), _) => Err(err),
            (None, Some(value)) => Ok(value),
            // every None above records an error first
            (None, None) => Err(ValidationError::single("", "Invalid input")),
        }
    }
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

// =============================================================================
// Product Input
// =============================================================================

/// A validated "create product" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[ts(type = "number")]
    pub price: Decimal,
    pub inventory: i64,
    pub category: String,
}

/// Validates a "create product" document.
///
/// ## Rules
/// - `name`: at least 3 characters
/// - `slug`: non-empty
/// - `description`: optional string
/// - `price`: number greater than zero
/// - `inventory`: whole number, zero or more
/// - `category`: non-empty
///
/// ## Example
/// ```rust
/// use scripters_core::validation::validate_product;
/// use serde_json::json;
///
/// let input = validate_product(&json!({
///     "name": "Deploy Script",
///     "slug": "deploy-script",
///     "price": 19.99,
///     "inventory": 10,
///     "category": "scripts"
/// }))
/// .unwrap();
/// assert_eq!(input.price.to_string(), "19.99");
/// ```
pub fn validate_product(input: &Value) -> ValidationResult<ProductInput> {
    let mut fields = Fields::root(input);
    if fields.object.is_none() {
        return fields.finish(None);
    }

    let name = fields.string_min("name", 3, "Name must be at least 3 characters");
    let slug = fields.string_min("slug", 1, "Slug is required");
    let description = fields.optional_string("description");

    let price = fields.decimal("price").and_then(|price| {
        if price <= Decimal::ZERO {
            fields.fail("price", "Price must be positive");
            None
        } else {
            Some(price)
        }
    });

    let inventory = fields
        .whole_number("inventory", "Inventory must be a whole number")
        .and_then(|inventory| {
            if inventory < 0 {
                fields.fail("inventory", "Inventory cannot be negative");
                None
            } else {
                Some(inventory)
            }
        });

    let category = fields.string_min("category", 1, "Category is required");

    let value = (|| {
        Some(ProductInput {
            name: name?.to_string(),
            slug: slug?.to_string(),
            description: description?.map(str::to_string),
            price: price?,
            inventory: inventory?,
            category: category?.to_string(),
        })
    })();
    fields.finish(value)
}

impl TryFrom<ProductInput> for NewProduct {
    type Error = ValidationError;

    /// Draft product from a validated request; price rounded to cents.
    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        let price = Money::from_decimal(input.price)
            .ok_or_else(|| ValidationError::single("price", "Price is too large"))?;

        let mut product = NewProduct::new(
            input.name,
            input.slug,
            price,
            input.inventory,
            input.category,
        );
        product.description = input.description;
        Ok(product)
    }
}

// =============================================================================
// Checkout Input
// =============================================================================

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutInput {
    pub shipping_address: ShippingAddress,
}

/// Validates a checkout document.
///
/// ## Rules (`shippingAddress.*`)
/// - `name`: at least 2 characters
/// - `address`: at least 5 characters
/// - `city`, `state`, `country`: at least 2 characters
/// - `zip`: `NNNNN` or `NNNNN-NNNN`
pub fn validate_checkout(input: &Value) -> ValidationResult<CheckoutInput> {
    let mut fields = Fields::root(input);
    if fields.object.is_none() {
        return fields.finish(None);
    }

    let address = fields.object("shippingAddress").and_then(|mut nested| {
        let address = shipping_address(&mut nested);
        fields.absorb(nested);
        address
    });

    let value = address.map(|shipping_address| CheckoutInput { shipping_address });
    fields.finish(value)
}

fn shipping_address(fields: &mut Fields<'_>) -> Option<ShippingAddress> {
    let name = fields.string_min("name", 2, "Name is required");
    let address = fields.string_min("address", 5, "Address is required");
    let city = fields.string_min("city", 2, "City is required");
    let state = fields.string_min("state", 2, "State is required");
    let zip = fields.string("zip").and_then(|zip| {
        if ZIP_RE.is_match(zip) {
            Some(zip)
        } else {
            fields.fail("zip", "Invalid ZIP code");
            None
        }
    });
    let country = fields.string_min("country", 2, "Country is required");

    Some(ShippingAddress {
        name: name?.to_string(),
        address: address?.to_string(),
        city: city?.to_string(),
        state: state?.to_string(),
        zip: zip?.to_string(),
        country: country?.to_string(),
    })
}

// =============================================================================
// Single-Field Validators
// =============================================================================

/// `0x` followed by 40 hex digits.
///
/// ## Example
/// ```rust
/// use scripters_core::validation::validate_wallet_address;
///
/// assert!(validate_wallet_address("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
/// assert!(validate_wallet_address("0x1234").is_err());
/// ```
pub fn validate_wallet_address(address: &str) -> ValidationResult<()> {
    if WALLET_RE.is_match(address) {
        Ok(())
    } else {
        Err(ValidationError::single("walletAddress", "Invalid wallet address"))
    }
}

/// `0x` followed by 64 hex digits.
pub fn validate_tx_hash(hash: &str) -> ValidationResult<()> {
    if TX_HASH_RE.is_match(hash) {
        Ok(())
    } else {
        Err(ValidationError::single("txHash", "Invalid transaction hash"))
    }
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::single("email", "Invalid email address"));
    }
    Ok(())
}

/// Quantity of a single cart or order line.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::single(
            "quantity",
            "Quantity must be at least 1",
        ));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::single(
            "quantity",
            format!("Quantity cannot exceed {}", MAX_ITEM_QUANTITY),
        ));
    }
    Ok(())
}

/// Number of lines in a cart.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::single(
            "items",
            format!("Cart cannot have more than {} items", MAX_CART_ITEMS),
        ));
    }
    Ok(())
}

/// Admin permission list: each entry non-empty, no duplicates.
pub fn validate_permissions(permissions: &[String]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for (i, permission) in permissions.iter().enumerate() {
        let field = format!("permissions.{}", i);
        if permission.trim().is_empty() {
            errors.push(FieldError::new(field, "Permission cannot be empty"));
        } else if !seen.insert(permission.as_str()) {
            errors.push(FieldError::new(field, "Duplicate permission"));
        }
    }

    match ValidationError::from_errors(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn valid_product() -> Value {
        json!({
            "name": "Deploy Script",
            "slug": "deploy-script",
            "description": "One-click deploys",
            "price": 19.99,
            "inventory": 10,
            "category": "scripts"
        })
    }

    fn valid_checkout() -> Value {
        json!({
            "shippingAddress": {
                "name": "Ada Lovelace",
                "address": "12 Analytical Way",
                "city": "London",
                "state": "LN",
                "zip": "12345",
                "country": "UK"
            }
        })
    }

    #[test]
    fn test_valid_product_is_returned_unchanged() {
        let input = validate_product(&valid_product()).unwrap();
        assert_eq!(input.name, "Deploy Script");
        assert_eq!(input.slug, "deploy-script");
        assert_eq!(input.description.as_deref(), Some("One-click deploys"));
        assert_eq!(input.price, dec!(19.99));
        assert_eq!(input.inventory, 10);
        assert_eq!(input.category, "scripts");
    }

    #[test]
    fn test_valid_product_boundaries_are_returned_unchanged() {
        let cases = [
            (
                json!({"name": "CLI", "slug": "cli", "price": 5, "inventory": 1, "category": "scripts"}),
                ProductInput {
                    name: "CLI".to_string(),
                    slug: "cli".to_string(),
                    description: None,
                    price: dec!(5),
                    inventory: 1,
                    category: "scripts".to_string(),
                },
            ),
            (
                json!({"name": "Sold Out", "slug": "sold-out", "description": "Gone", "price": 12.5, "inventory": 0, "category": "themes"}),
                ProductInput {
                    name: "Sold Out".to_string(),
                    slug: "sold-out".to_string(),
                    description: Some("Gone".to_string()),
                    price: dec!(12.5),
                    inventory: 0,
                    category: "themes".to_string(),
                },
            ),
            (
                json!({"name": "Penny Plugin", "slug": "penny", "price": 0.01, "inventory": 3, "category": "plugins"}),
                ProductInput {
                    name: "Penny Plugin".to_string(),
                    slug: "penny".to_string(),
                    description: None,
                    price: dec!(0.01),
                    inventory: 3,
                    category: "plugins".to_string(),
                },
            ),
        ];

        for (doc, expected) in cases {
            assert_eq!(validate_product(&doc).unwrap(), expected, "{}", doc);
        }
    }

    #[test]
    fn test_product_price_too_large_for_cents() {
        for price in [json!(1e20), json!(5e28)] {
            let mut doc = valid_product();
            doc["price"] = price;

            let input = validate_product(&doc).unwrap();
            let err = NewProduct::try_from(input).unwrap_err();
            assert!(err.has_field("price"));
        }
    }

    #[test]
    fn test_each_missing_product_field_is_reported() {
        for field in ["name", "slug", "price", "inventory", "category"] {
            let mut doc = valid_product();
            doc.as_object_mut().unwrap().remove(field);

            let err = validate_product(&doc).unwrap_err();
            assert_eq!(err.messages_for(field), vec!["Required"], "{}", field);
            assert_eq!(err.errors().len(), 1);
        }
    }

    #[test]
    fn test_product_reports_every_violation() {
        let err = validate_product(&json!({
            "name": "ab",
            "slug": "",
            "price": 0,
            "inventory": -1,
            "category": ""
        }))
        .unwrap_err();

        let map = err.to_map();
        assert_eq!(map["name"], vec!["Name must be at least 3 characters"]);
        assert_eq!(map["slug"], vec!["Slug is required"]);
        assert_eq!(map["price"], vec!["Price must be positive"]);
        assert_eq!(map["inventory"], vec!["Inventory cannot be negative"]);
        assert_eq!(map["category"], vec!["Category is required"]);
    }

    #[test]
    fn test_product_type_errors() {
        let mut doc = valid_product();
        doc["price"] = json!("19.99");
        doc["inventory"] = json!(2.5);
        doc["description"] = json!(42);

        let err = validate_product(&doc).unwrap_err();
        assert_eq!(err.messages_for("price"), vec!["Expected number"]);
        assert_eq!(
            err.messages_for("inventory"),
            vec!["Inventory must be a whole number"]
        );
        assert_eq!(err.messages_for("description"), vec!["Expected string"]);
    }

    #[test]
    fn test_inventory_accepts_integral_float() {
        let mut doc = valid_product();
        doc["inventory"] = json!(3.0);
        assert_eq!(validate_product(&doc).unwrap().inventory, 3);

        doc["inventory"] = json!(0);
        assert_eq!(validate_product(&doc).unwrap().inventory, 0);
    }

    #[test]
    fn test_name_length_counts_characters() {
        let mut doc = valid_product();
        doc["name"] = json!("日本語");
        assert!(validate_product(&doc).is_ok());

        doc["name"] = json!("éé");
        assert!(validate_product(&doc).is_err());
    }

    #[test]
    fn test_non_object_root() {
        let err = validate_product(&json!([1, 2])).unwrap_err();
        assert_eq!(err.messages_for(""), vec!["Expected object"]);

        let err = validate_checkout(&json!("nope")).unwrap_err();
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn test_product_input_into_new_product() {
        let mut doc = valid_product();
        doc["price"] = json!(19.995);
        let input = validate_product(&doc).unwrap();

        let product = NewProduct::try_from(input).unwrap();
        assert_eq!(product.price.cents(), 2000);
        assert_eq!(product.description.as_deref(), Some("One-click deploys"));
        assert_eq!(product.status, crate::types::ProductStatus::Draft);
    }

    #[test]
    fn test_valid_checkout() {
        let input = validate_checkout(&valid_checkout()).unwrap();
        assert_eq!(input.shipping_address.city, "London");
        assert_eq!(input.shipping_address.zip, "12345");
    }

    #[test]
    fn test_zip_codes() {
        for (zip, ok) in [
            ("12345", true),
            ("12345-6789", true),
            ("1234", false),
            ("ABCDE", false),
            ("12345-678", false),
        ] {
            let mut doc = valid_checkout();
            doc["shippingAddress"]["zip"] = json!(zip);
            let result = validate_checkout(&doc);
            assert_eq!(result.is_ok(), ok, "{}", zip);
            if !ok {
                assert_eq!(
                    result.unwrap_err().messages_for("shippingAddress.zip"),
                    vec!["Invalid ZIP code"]
                );
            }
        }
    }

    #[test]
    fn test_checkout_reports_nested_fields() {
        let err = validate_checkout(&json!({
            "shippingAddress": {
                "name": "A",
                "address": "1 St",
                "city": "X",
                "zip": "1234",
                "country": "U"
            }
        }))
        .unwrap_err();

        let map = err.to_map();
        assert_eq!(map["shippingAddress.name"], vec!["Name is required"]);
        assert_eq!(map["shippingAddress.address"], vec!["Address is required"]);
        assert_eq!(map["shippingAddress.city"], vec!["City is required"]);
        assert_eq!(map["shippingAddress.state"], vec!["Required"]);
        assert_eq!(map["shippingAddress.zip"], vec!["Invalid ZIP code"]);
        assert_eq!(map["shippingAddress.country"], vec!["Country is required"]);
    }

    #[test]
    fn test_checkout_requires_address_object() {
        let err = validate_checkout(&json!({})).unwrap_err();
        assert_eq!(err.messages_for("shippingAddress"), vec!["Required"]);

        let err = validate_checkout(&json!({ "shippingAddress": "12 Main St" })).unwrap_err();
        assert_eq!(err.messages_for("shippingAddress"), vec!["Expected object"]);
    }

    #[test]
    fn test_wallet_and_tx_hash() {
        assert!(validate_wallet_address("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
        assert!(validate_wallet_address("52908400098527886E0F7030069857D2E4169EE7").is_err());
        assert!(validate_wallet_address("0xZZ908400098527886E0F7030069857D2E4169EE7").is_err());

        let hash = format!("0x{}", "ab".repeat(32));
        assert!(validate_tx_hash(&hash).is_ok());
        assert!(validate_tx_hash("0xabc").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("not an email").is_err());
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_quantity_and_cart_size() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());

        assert!(validate_cart_size(100).is_ok());
        assert!(validate_cart_size(101).is_err());
    }

    #[test]
    fn test_permissions() {
        let ok = vec!["products:write".to_string(), "orders:read".to_string()];
        assert!(validate_permissions(&ok).is_ok());
        assert!(validate_permissions(&[]).is_ok());

        let bad = vec![
            "orders:read".to_string(),
            " ".to_string(),
            "orders:read".to_string(),
        ];
        let err = validate_permissions(&bad).unwrap_err();
        assert_eq!(err.messages_for("permissions.1"), vec!["Permission cannot be empty"]);
        assert_eq!(err.messages_for("permissions.2"), vec!["Duplicate permission"]);
    }
}
