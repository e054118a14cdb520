//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD by id and slug
//! - Status and category listings
//! - Delta inventory updates that can never go below zero
//!
//! ## Inventory Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ✅ Delta update, guarded in the WHERE clause                       │
//! │     UPDATE products SET inventory = inventory + ?2                  │
//! │     WHERE id = ?1 AND inventory + ?2 >= 0                           │
//! │                                                                     │
//! │  0 rows + product exists  → InsufficientInventory                   │
//! │  0 rows + no product      → NotFound                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use scripters_core::schema::Products;
use scripters_core::{
    new_id, CoreError, CryptoAmount, CryptoCurrency, Money, NewProduct, Product, ProductStatus,
    ValidationError,
};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::count_rows;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_slug("deploy-script").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

/// Stored units of a crypto price, which must be quoted in `currency`.
fn crypto_units(
    field: &str,
    amount: Option<CryptoAmount>,
    currency: CryptoCurrency,
) -> DbResult<Option<i64>> {
    match amount {
        Some(a) if a.currency() != currency => Err(CoreError::from(ValidationError::single(
            field,
            format!("Price must be quoted in {}", currency.code()),
        ))
        .into()),
        Some(a) => Ok(Some(a.units())),
        None => Ok(None),
    }
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored row with generated id and timestamps
    /// * `Err(DbError::Sqlx)` - Slug taken (`is_unique_violation`) or a
    ///   negative amount (`is_check_violation`)
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let id = new_id();
        debug!(id = %id, slug = %product.slug, "Inserting product");

        let price_eth_units = crypto_units("priceEth", product.price_eth, CryptoCurrency::Eth)?;
        let price_usdc_cents = crypto_units("priceUsdc", product.price_usdc, CryptoCurrency::Usdc)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                id, name, slug, description,
                price_cents, price_eth_units, price_usdc_cents,
                inventory, category, status, license,
                file_url, file_type, tags, images
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15
            )
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(price_eth_units)
        .bind(price_usdc_cents)
        .bind(product.inventory)
        .bind(&product.category)
        .bind(product.status)
        .bind(product.license)
        .bind(&product.file_url)
        .bind(&product.file_type)
        .bind(Json(&product.tags))
        .bind(Json(&product.images))
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Products in a status, by name.
    pub async fn list_by_status(&self, status: ProductStatus) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE status = ?1 ORDER BY name, id",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        debug!(status = ?status, count = products.len(), "Listed products by status");
        Ok(products)
    }

    /// Active products in a category, by name.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE category = ?1 AND status = ?2 ORDER BY name, id",
        )
        .bind(category)
        .bind(ProductStatus::Active)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn update_status(&self, id: &str, status: ProductStatus) -> DbResult<Product> {
        debug!(id = %id, status = ?status, "Updating product status");

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET status = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Reprices a product.
    ///
    /// Existing order items keep their snapshot price.
    pub async fn update_price(
        &self,
        id: &str,
        price: Money,
        price_eth: Option<CryptoAmount>,
        price_usdc: Option<CryptoAmount>,
    ) -> DbResult<Product> {
        debug!(id = %id, price = %price, "Updating product price");

        let price_eth_units = crypto_units("priceEth", price_eth, CryptoCurrency::Eth)?;
        let price_usdc_cents = crypto_units("priceUsdc", price_usdc, CryptoCurrency::Usdc)?;

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET price_cents = ?2,
                price_eth_units = ?3,
                price_usdc_cents = ?4,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(price.cents())
        .bind(price_eth_units)
        .bind(price_usdc_cents)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Adds `delta` to inventory (negative to remove stock).
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated row
    /// * `Err(DbError::Core(InsufficientInventory))` - Would go below zero
    /// * `Err(DbError::NotFound)` - No such product
    pub async fn adjust_inventory(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting inventory");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET inventory = inventory + ?2,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1 AND inventory + ?2 >= 0
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(product) => Ok(product),
            None => match self.get_by_id(id).await? {
                Some(product) => Err(DbError::Core(CoreError::InsufficientInventory {
                    product_id: product.id,
                    available: product.inventory,
                    requested: -delta,
                })),
                None => Err(DbError::not_found("Product", id)),
            },
        }
    }

    /// Deletes a product.
    ///
    /// Fails with a foreign key violation while any order item still
    /// references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        count_rows::<Products>(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use scripters_core::ProductLicense;

    #[tokio::test]
    async fn test_insert_round_trips_every_column() {
        let db = fixtures::db().await;

        let mut new = NewProduct::new("Deploy Script", "deploy-script", Money::from_cents(1999), 5, "scripts");
        new.description = Some("One-click deploys".to_string());
        new.price_eth = Some(CryptoAmount::from_units(1_500_000, CryptoCurrency::Eth));
        new.license = Some(ProductLicense::Commercial);
        new.tags = vec!["devops".to_string(), "bash".to_string()];
        new.images = vec!["/img/deploy.png".to_string()];

        let product = db.products().insert(&new).await.unwrap();
        assert_eq!(product.price().cents(), 1999);
        assert_eq!(product.price_eth().unwrap().units(), 1_500_000);
        assert!(product.price_usdc().is_none());
        assert_eq!(product.status, ProductStatus::Draft);
        assert_eq!(product.license, Some(ProductLicense::Commercial));
        assert_eq!(product.tags, vec!["devops", "bash"]);

        let by_slug = db.products().get_by_slug("deploy-script").await.unwrap().unwrap();
        assert_eq!(by_slug, product);
    }

    #[tokio::test]
    async fn test_slug_is_unique() {
        let db = fixtures::db().await;
        fixtures::product(&db, "deploy", 100, 1).await;

        let new = NewProduct::new("Other", "deploy", Money::from_cents(100), 1, "scripts");
        let err = db.products().insert(&new).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_negative_price_is_a_check_violation() {
        let db = fixtures::db().await;
        let new = NewProduct::new("Broken", "broken", Money::from_cents(-1), 1, "scripts");
        let err = db.products().insert(&new).await.unwrap_err();
        assert!(err.is_check_violation());
    }

    #[tokio::test]
    async fn test_crypto_price_currency_must_match_column() {
        let db = fixtures::db().await;
        let mut new = NewProduct::new("Mixed", "mixed", Money::from_cents(100), 1, "scripts");
        new.price_eth = Some(CryptoAmount::from_units(100, CryptoCurrency::Usdc));

        let err = db.products().insert(&new).await.unwrap_err();
        match err {
            DbError::Core(CoreError::Validation(v)) => assert!(v.has_field("priceEth")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listings() {
        let db = fixtures::db().await;
        let active = fixtures::product(&db, "b-active", 100, 1).await;
        let draft = NewProduct::new("A Draft", "a-draft", Money::from_cents(100), 1, "scripts");
        db.products().insert(&draft).await.unwrap();

        let drafts = db.products().list_by_status(ProductStatus::Draft).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].slug, "a-draft");

        let scripts = db.products().list_by_category("scripts").await.unwrap();
        assert_eq!(scripts, vec![active]);
        assert!(db.products().list_by_category("themes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_and_price() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "deploy", 1000, 1).await;

        let archived = db
            .products()
            .update_status(&product.id, ProductStatus::Archived)
            .await
            .unwrap();
        assert_eq!(archived.status, ProductStatus::Archived);

        let repriced = db
            .products()
            .update_price(
                &product.id,
                Money::from_cents(1500),
                None,
                Some(CryptoAmount::from_units(1500, CryptoCurrency::Usdc)),
            )
            .await
            .unwrap();
        assert_eq!(repriced.price_cents, 1500);
        assert_eq!(repriced.price_usdc_cents, Some(1500));
    }

    #[tokio::test]
    async fn test_adjust_inventory_never_goes_negative() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "deploy", 1000, 3).await;

        let restocked = db.products().adjust_inventory(&product.id, 2).await.unwrap();
        assert_eq!(restocked.inventory, 5);

        let err = db.products().adjust_inventory(&product.id, -6).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InsufficientInventory {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = db.products().adjust_inventory("missing", -1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "deploy", 1000, 3).await;

        db.products().delete(&product.id).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert!(matches!(
            db.products().delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
