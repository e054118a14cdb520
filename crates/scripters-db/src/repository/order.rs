//! # Order Repository
//!
//! Order placement and lifecycle.
//!
//! ## Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  place_order(order, items)                                          │
//! │                                                                     │
//! │  1. Check: at least one item, totals add up, subtotal = Σ lines     │
//! │  2. BEGIN                                                           │
//! │  3. INSERT orders                                                   │
//! │  4. SELECT product               ── not active? ROLLBACK            │
//! │  5. INSERT order_items (name + unit price snapshots)                │
//! │  6. UPDATE products SET inventory = inventory - qty                 │
//! │        WHERE inventory >= qty          ── 0 rows? ROLLBACK          │
//! │  7. UPDATE users SET last_purchase_at = now                         │
//! │  8. COMMIT                                                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Changes
//! Every status write re-checks the status it read in its `WHERE` clause.
//! If another writer got there first, nothing is updated and the call
//! fails with [`DbError::Conflict`].

use scripters_core::schema::Orders;
use scripters_core::validation::{validate_quantity, validate_tx_hash};
use scripters_core::{
    new_id, CoreError, CoreResult, Money, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus, Product, ProductStatus, ValidationError,
};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::count_rows;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Places an order with its items in a single transaction.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Stored order, status and payment status `pending`
    /// * `Err(DbError::Core(EmptyOrder | TotalMismatch | SubtotalMismatch))` -
    ///   Rejected before touching the store
    /// * `Err(DbError::Core(AmountOutOfRange))` - A line total or the sum of
    ///   the amounts overflows
    /// * `Err(DbError::Core(ProductUnavailable))` - A line's product is not
    ///   active; nothing is written
    /// * `Err(DbError::Core(InsufficientInventory))` - Not enough stock for a
    ///   line; nothing is written
    /// * `Err(DbError::NotFound)` - A line references a missing product
    pub async fn place_order(&self, order: &NewOrder, items: &[NewOrderItem]) -> DbResult<Order> {
        if items.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        for item in items {
            validate_quantity(item.quantity).map_err(CoreError::from)?;
        }
        order.totals.verify()?;
        let line_totals = items
            .iter()
            .map(NewOrderItem::line_total)
            .collect::<CoreResult<Vec<Money>>>()?;
        order.totals.verify_subtotal(line_totals)?;

        let (currency, total_crypto_units) = match (order.payment_method, order.total_crypto) {
            (PaymentMethod::Crypto, Some(amount)) => (Some(amount.currency()), Some(amount.units())),
            (PaymentMethod::Crypto, None) => {
                return Err(CoreError::from(ValidationError::single(
                    "totalCrypto",
                    "Required for crypto payments",
                ))
                .into());
            }
            (PaymentMethod::Card, _) => (None, None),
        };

        let id = new_id();
        debug!(
            id = %id,
            order_number = %order.order_number,
            items = items.len(),
            total = %order.totals.total,
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;

        let placed = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, payment_method,
                currency, total_crypto_units,
                subtotal_cents, tax_cents, shipping_cents, total_cents,
                shipping_address
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.payment_method)
        .bind(currency)
        .bind(total_crypto_units)
        .bind(order.totals.subtotal.cents())
        .bind(order.totals.tax.cents())
        .bind(order.totals.shipping.cents())
        .bind(order.totals.total.cents())
        .bind(Json(&order.shipping_address))
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            if !product.can_sell(item.quantity) {
                warn!(
                    product_id = %product.id,
                    available = product.inventory,
                    requested = item.quantity,
                    "Rejected order line"
                );
                return Err(if product.status != ProductStatus::Active {
                    CoreError::ProductUnavailable {
                        product_id: product.id,
                    }
                } else {
                    CoreError::InsufficientInventory {
                        product_id: product.id,
                        available: product.inventory,
                        requested: item.quantity,
                    }
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name, quantity, unit_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(new_id())
            .bind(&placed.id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;

            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET inventory = inventory - ?2,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
                WHERE id = ?1 AND inventory >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT inventory FROM products WHERE id = ?1")
                        .bind(&item.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                // tx is dropped un-committed, which rolls everything back
                return Err(match available {
                    Some(available) => CoreError::InsufficientInventory {
                        product_id: item.product_id.clone(),
                        available,
                        requested: item.quantity,
                    }
                    .into(),
                    None => DbError::not_found("Product", &item.product_id),
                });
            }
        }

        sqlx::query(
            r#"
            UPDATE users
            SET last_purchase_at = strftime('%Y-%m-%dT%H:%M:%fZ','now'),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            "#,
        )
        .bind(&order.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = %placed.id, "Order placed");
        Ok(placed)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn get_by_order_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = ?1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Line items of an order, in insertion order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn require(&self, id: &str) -> DbResult<Order> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Moves the fulfilment status forward.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(InvalidStatusTransition))` - Not allowed from the
    ///   current status
    /// * `Err(DbError::Conflict)` - Status changed since it was read
    pub async fn transition_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        let current = self.require(id).await?;

        if let Err(err) = current.status.ensure_transition(next) {
            warn!(id = %id, from = %current.status, to = %next, "Rejected order status change");
            return Err(err.into());
        }

        debug!(id = %id, from = %current.status, to = %next, "Transitioning order status");

        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1 AND status = ?3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(current.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::conflict("Order", id))
    }

    /// Moves the payment status forward.
    pub async fn transition_payment_status(
        &self,
        id: &str,
        next: PaymentStatus,
    ) -> DbResult<Order> {
        let current = self.require(id).await?;
        self.write_payment(&current, next, None, None).await
    }

    /// Records a settled card intent and confirms the payment.
    pub async fn record_card_payment(&self, id: &str, payment_intent_id: &str) -> DbResult<Order> {
        let current = self.require(id).await?;
        Self::ensure_method(&current, PaymentMethod::Card)?;
        self.write_payment(&current, PaymentStatus::Confirmed, Some(payment_intent_id), None)
            .await
    }

    /// Records an on-chain transaction and confirms the payment.
    ///
    /// A hash already recorded on another order is a unique violation.
    pub async fn record_crypto_payment(&self, id: &str, tx_hash: &str) -> DbResult<Order> {
        validate_tx_hash(tx_hash).map_err(CoreError::from)?;
        let current = self.require(id).await?;
        Self::ensure_method(&current, PaymentMethod::Crypto)?;
        self.write_payment(&current, PaymentStatus::Confirmed, None, Some(tx_hash))
            .await
    }

    fn ensure_method(order: &Order, method: PaymentMethod) -> DbResult<()> {
        if order.payment_method != method {
            return Err(CoreError::from(ValidationError::single(
                "paymentMethod",
                format!("Order is not paid by {}", method),
            ))
            .into());
        }
        Ok(())
    }

    /// Gated, compare-and-set payment status write. `None` references keep
    /// their stored value.
    async fn write_payment(
        &self,
        current: &Order,
        next: PaymentStatus,
        payment_intent_id: Option<&str>,
        tx_hash: Option<&str>,
    ) -> DbResult<Order> {
        if let Err(err) = current.payment_status.ensure_transition(next) {
            warn!(
                id = %current.id,
                from = %current.payment_status,
                to = %next,
                "Rejected payment status change"
            );
            return Err(err.into());
        }

        debug!(
            id = %current.id,
            from = %current.payment_status,
            to = %next,
            "Transitioning payment status"
        );

        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET payment_status = ?2,
                payment_intent_id = COALESCE(?4, payment_intent_id),
                tx_hash = COALESCE(?5, tx_hash),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1 AND payment_status = ?3
            RETURNING *
            "#,
        )
        .bind(&current.id)
        .bind(next)
        .bind(current.payment_status)
        .bind(payment_intent_id)
        .bind(tx_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::conflict("Order", &current.id))
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes an order. Its items and download grants go with it; the
    /// products they referenced stay.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        count_rows::<Orders>(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::Database;
    use scripters_core::format::generate_order_number;
    use scripters_core::{CryptoAmount, CryptoCurrency, NewDownload, OrderTotals, User};

    const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    fn card_order(user: &User, items: &[NewOrderItem]) -> NewOrder {
        let subtotal = Money::try_sum(items.iter().map(|i| i.line_total().unwrap())).unwrap();
        NewOrder {
            order_number: generate_order_number(),
            user_id: user.id.clone(),
            payment_method: PaymentMethod::Card,
            totals: OrderTotals::new(subtotal, Money::zero(), Money::zero()).unwrap(),
            total_crypto: None,
            shipping_address: fixtures::address(),
        }
    }

    async fn setup() -> (Database, User, Product) {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "ada@example.com").await;
        let product = fixtures::product(&db, "deploy", 1250, 5).await;
        (db, user, product)
    }

    #[tokio::test]
    async fn test_place_order_writes_everything() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 2)];
        let new = card_order(&user, &items);

        let order = db.orders().place_order(&new, &items).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.total_cents, 2500);
        assert_eq!(order.shipping_address, fixtures::address());
        assert!(order.currency.is_none());

        let lines = db.orders().items(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_name, "Script deploy");
        assert_eq!(lines[0].line_total().unwrap().cents(), 2500);

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stock.inventory, 3);

        let buyer = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert!(buyer.last_purchase_at.is_some());

        let by_number = db
            .orders()
            .get_by_order_number(&new.order_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, order.id);
        assert_eq!(db.orders().list_for_user(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_items_keep_their_snapshot_price() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let order = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap();

        db.products()
            .update_price(&product.id, Money::from_cents(9999), None, None)
            .await
            .unwrap();

        let lines = db.orders().items(&order.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 1250);
    }

    #[tokio::test]
    async fn test_insufficient_inventory_rolls_back() {
        let (db, user, product) = setup().await;
        let other = fixtures::product(&db, "backup", 500, 10).await;
        let items = vec![
            NewOrderItem::snapshot(&other, 4),
            NewOrderItem::snapshot(&product, 6),
        ];

        let err = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap_err();
        match err {
            DbError::Core(CoreError::InsufficientInventory {
                product_id,
                available,
                requested,
            }) => {
                assert_eq!(product_id, product.id);
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(db.orders().count().await.unwrap(), 0);
        let untouched = db.products().get_by_id(&other.id).await.unwrap().unwrap();
        assert_eq!(untouched.inventory, 10);
        let buyer = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert!(buyer.last_purchase_at.is_none());
    }

    #[tokio::test]
    async fn test_totals_are_checked_before_the_store() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];

        let mut bad_total = card_order(&user, &items);
        bad_total.totals.total = Money::from_cents(1);
        let err = db.orders().place_order(&bad_total, &items).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::TotalMismatch { .. })));

        let mut bad_subtotal = card_order(&user, &items);
        bad_subtotal.totals =
            OrderTotals::new(Money::from_cents(1), Money::zero(), Money::zero()).unwrap();
        let err = db.orders().place_order(&bad_subtotal, &items).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SubtotalMismatch { .. })));

        let err = db
            .orders()
            .place_order(&card_order(&user, &[]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::EmptyOrder)));

        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflowing_line_total_is_rejected() {
        let (db, user, product) = setup().await;
        let mut item = NewOrderItem::snapshot(&product, 2);
        item.unit_price = Money::from_cents(i64::MAX);

        let mut new = card_order(&user, &[NewOrderItem::snapshot(&product, 1)]);
        new.totals = OrderTotals::new(Money::from_cents(i64::MAX), Money::zero(), Money::zero())
            .unwrap();
        let err = db.orders().place_order(&new, &[item]).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountOutOfRange)));

        new.totals.tax = Money::from_cents(1);
        let err = db
            .orders()
            .place_order(&new, &[NewOrderItem::snapshot(&product, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountOutOfRange)));

        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_inactive_product_is_rejected() {
        let (db, user, product) = setup().await;
        let other = fixtures::product(&db, "backup", 500, 10).await;
        db.products()
            .update_status(&product.id, ProductStatus::Archived)
            .await
            .unwrap();
        let items = vec![
            NewOrderItem::snapshot(&other, 1),
            NewOrderItem::snapshot(&product, 1),
        ];

        let err = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap_err();
        match err {
            DbError::Core(CoreError::ProductUnavailable { product_id }) => {
                assert_eq!(product_id, product.id)
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(db.orders().count().await.unwrap(), 0);
        let untouched = db.products().get_by_id(&other.id).await.unwrap().unwrap();
        assert_eq!(untouched.inventory, 10);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (db, user, product) = setup().await;
        let mut item = NewOrderItem::snapshot(&product, 1);
        item.product_id = "missing".to_string();
        let items = vec![item];

        let err = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_a_foreign_key_violation() {
        let (db, mut user, product) = setup().await;
        user.id = "ghost".to_string();
        let items = vec![NewOrderItem::snapshot(&product, 1)];

        let err = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let order = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap();

        let shipped = db
            .orders()
            .transition_status(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let err = db
            .orders()
            .transition_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidStatusTransition { .. })
        ));

        let err = db
            .orders()
            .transition_status("missing", OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_card_payment() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let order = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap();

        let paid = db
            .orders()
            .record_card_payment(&order.id, "pi_3Nabc")
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Confirmed);
        assert_eq!(paid.payment_intent_id.as_deref(), Some("pi_3Nabc"));

        // crypto hash on a card order
        let err = db
            .orders()
            .record_crypto_payment(&order.id, TX_HASH)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let refunded = db
            .orders()
            .transition_payment_status(&order.id, PaymentStatus::Refunded)
            .await
            .unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
        assert_eq!(refunded.payment_intent_id.as_deref(), Some("pi_3Nabc"));

        let err = db
            .orders()
            .transition_payment_status(&order.id, PaymentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_crypto_payment() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];

        let mut new = card_order(&user, &items);
        new.payment_method = PaymentMethod::Crypto;
        let err = db.orders().place_order(&new, &items).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        new.total_crypto = Some(CryptoAmount::from_units(1250, CryptoCurrency::Usdc));
        let order = db.orders().place_order(&new, &items).await.unwrap();
        assert_eq!(order.total_crypto().unwrap().to_string(), "12.50 USDC");

        let err = db
            .orders()
            .record_crypto_payment(&order.id, "0xnope")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let paid = db
            .orders()
            .record_crypto_payment(&order.id, TX_HASH)
            .await
            .unwrap();
        assert_eq!(paid.tx_hash.as_deref(), Some(TX_HASH));
        assert_eq!(paid.payment_status, PaymentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_tx_hash_is_unique_across_orders() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let mut new = card_order(&user, &items);
        new.payment_method = PaymentMethod::Crypto;
        new.total_crypto = Some(CryptoAmount::from_units(1250, CryptoCurrency::Usdc));

        let first = db.orders().place_order(&new, &items).await.unwrap();
        new.order_number = generate_order_number();
        let second = db.orders().place_order(&new, &items).await.unwrap();

        db.orders().record_crypto_payment(&first.id, TX_HASH).await.unwrap();
        let err = db
            .orders()
            .record_crypto_payment(&second.id, TX_HASH)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items_and_downloads() {
        let (db, user, product) = setup().await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let order = db
            .orders()
            .place_order(&card_order(&user, &items), &items)
            .await
            .unwrap();
        db.downloads()
            .grant(&NewDownload {
                order_id: order.id.clone(),
                product_id: product.id.clone(),
                user_id: user.id.clone(),
                download_url: Some("https://cdn.example.com/deploy.zip".to_string()),
                expires_at: None,
            })
            .await
            .unwrap();

        // referenced products cannot be deleted
        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());

        db.orders().delete(&order.id).await.unwrap();

        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
        assert!(db.orders().items(&order.id).await.unwrap().is_empty());
        assert!(db.downloads().list_for_order(&order.id).await.unwrap().is_empty());
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_some());
        assert!(db.users().get_by_id(&user.id).await.unwrap().is_some());

        assert!(matches!(
            db.orders().delete(&order.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
