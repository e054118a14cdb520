//! # Cart Repository
//!
//! Carts belong to a signed-in user or an anonymous session. Lines live in
//! the `items` JSON column as `{productId, quantity}` records, so every
//! change is a read-modify-write of the whole list inside one transaction.
//!
//! ## Limits
//! - at most [`MAX_CART_ITEMS`] lines
//! - each line quantity in `1..=`[`MAX_ITEM_QUANTITY`]

use scripters_core::validation::{validate_cart_size, validate_quantity};
use scripters_core::{
    new_id, Cart, CartItem, CartOwner, CoreError, CoreResult, NewCart, MAX_CART_ITEMS,
    MAX_ITEM_QUANTITY,
};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Creates a cart, checking the initial lines against the limits.
    ///
    /// A second cart for the same user or session is a unique violation.
    pub async fn create(&self, cart: &NewCart) -> DbResult<Cart> {
        validate_cart_size(cart.items.len()).map_err(CoreError::from)?;
        for item in &cart.items {
            validate_quantity(item.quantity).map_err(CoreError::from)?;
        }

        let (user_id, session_id) = match &cart.owner {
            CartOwner::User(id) => (Some(id.as_str()), None),
            CartOwner::Session(id) => (None, Some(id.as_str())),
        };

        let id = new_id();
        debug!(id = %id, owner = ?cart.owner, "Creating cart");

        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (id, user_id, session_id, items)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(session_id)
        .bind(Json(&cart.items))
        .fetch_one(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Empty cart for a signed-in user.
    pub async fn create_for_user(&self, user_id: &str) -> DbResult<Cart> {
        self.create(&NewCart {
            owner: CartOwner::User(user_id.to_string()),
            items: Vec::new(),
        })
        .await
    }

    /// Empty cart for an anonymous session.
    pub async fn create_for_session(&self, session_id: &str) -> DbResult<Cart> {
        self.create(&NewCart {
            owner: CartOwner::Session(session_id.to_string()),
            items: Vec::new(),
        })
        .await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cart)
    }

    pub async fn get_for_user(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cart)
    }

    pub async fn get_for_session(&self, session_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE session_id = ?1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cart)
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(QuantityTooLarge))` - Merged line would exceed
    ///   the per-line maximum
    /// * `Err(DbError::Core(CartTooLarge))` - A new line would exceed the
    ///   line limit
    pub async fn add_item(&self, cart_id: &str, product_id: &str, quantity: i64) -> DbResult<Cart> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        debug!(cart_id = %cart_id, product_id = %product_id, quantity = %quantity, "Adding cart item");

        self.modify(cart_id, |items| {
            match items.iter_mut().find(|i| i.product_id == product_id) {
                Some(line) => {
                    let merged = line.quantity + quantity;
                    if merged > MAX_ITEM_QUANTITY {
                        return Err(CoreError::QuantityTooLarge {
                            requested: merged,
                            max: MAX_ITEM_QUANTITY,
                        });
                    }
                    line.quantity = merged;
                }
                None => {
                    if items.len() >= MAX_CART_ITEMS {
                        return Err(CoreError::CartTooLarge {
                            max: MAX_CART_ITEMS,
                        });
                    }
                    items.push(CartItem {
                        product_id: product_id.to_string(),
                        quantity,
                    });
                }
            }
            Ok(())
        })
        .await
    }

    /// Sets a line's quantity. Zero removes the line.
    pub async fn set_quantity(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Cart> {
        if quantity == 0 {
            return self.remove_item(cart_id, product_id).await;
        }
        validate_quantity(quantity).map_err(CoreError::from)?;
        debug!(cart_id = %cart_id, product_id = %product_id, quantity = %quantity, "Setting cart quantity");

        self.modify(cart_id, |items| {
            match items.iter_mut().find(|i| i.product_id == product_id) {
                Some(line) => line.quantity = quantity,
                None => {
                    if items.len() >= MAX_CART_ITEMS {
                        return Err(CoreError::CartTooLarge {
                            max: MAX_CART_ITEMS,
                        });
                    }
                    items.push(CartItem {
                        product_id: product_id.to_string(),
                        quantity,
                    });
                }
            }
            Ok(())
        })
        .await
    }

    /// Drops a product's line; absent lines are ignored.
    pub async fn remove_item(&self, cart_id: &str, product_id: &str) -> DbResult<Cart> {
        debug!(cart_id = %cart_id, product_id = %product_id, "Removing cart item");

        self.modify(cart_id, |items| {
            items.retain(|i| i.product_id != product_id);
            Ok(())
        })
        .await
    }

    pub async fn clear(&self, cart_id: &str) -> DbResult<Cart> {
        debug!(cart_id = %cart_id, "Clearing cart");

        self.modify(cart_id, |items| {
            items.clear();
            Ok(())
        })
        .await
    }

    pub async fn delete(&self, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Deleting cart");

        let result = sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", cart_id));
        }
        Ok(())
    }

    /// Applies `change` to the stored lines and writes them back.
    async fn modify<F>(&self, cart_id: &str, change: F) -> DbResult<Cart>
    where
        F: FnOnce(&mut Vec<CartItem>) -> CoreResult<()>,
    {
        let mut tx = self.pool.begin().await?;

        let mut cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = ?1")
            .bind(cart_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", cart_id))?;

        change(&mut cart.items)?;

        let cart = sqlx::query_as::<_, Cart>(
            r#"
            UPDATE carts
            SET items = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(cart_id)
        .bind(Json(&cart.items))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
