//! # Download Repository
//!
//! Download grants for purchased digital products.
//!
//! Grants belong to an order and are removed with it. `expires_at` is
//! stored as given and never checked here; see [`Download::is_expired`].

use scripters_core::{new_id, Download, NewDownload};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct DownloadRepository {
    pool: SqlitePool,
}

impl DownloadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DownloadRepository { pool }
    }

    /// Grants a download. The order, product and user must exist.
    pub async fn grant(&self, download: &NewDownload) -> DbResult<Download> {
        let id = new_id();
        debug!(
            id = %id,
            order_id = %download.order_id,
            product_id = %download.product_id,
            "Granting download"
        );

        let download = sqlx::query_as::<_, Download>(
            r#"
            INSERT INTO downloads (id, order_id, product_id, user_id, download_url, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&download.order_id)
        .bind(&download.product_id)
        .bind(&download.user_id)
        .bind(&download.download_url)
        .bind(download.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(download)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Download>> {
        let download = sqlx::query_as::<_, Download>("SELECT * FROM downloads WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(download)
    }

    /// A user's grants, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Download>> {
        let downloads = sqlx::query_as::<_, Download>(
            "SELECT * FROM downloads WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(downloads)
    }

    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Download>> {
        let downloads = sqlx::query_as::<_, Download>(
            "SELECT * FROM downloads WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(downloads)
    }

    /// Counts one download. Expired grants are counted too.
    pub async fn record_download(&self, id: &str) -> DbResult<Download> {
        debug!(id = %id, "Recording download");

        sqlx::query_as::<_, Download>(
            r#"
            UPDATE downloads
            SET download_count = download_count + 1
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Download", id))
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
    use chrono::{Duration, TimeZone, Utc};
    use scripters_core::format::generate_order_number;
    use scripters_core::{NewOrder, NewOrderItem, Order, OrderTotals, PaymentMethod, User};

    async fn purchase() -> (Database, User, Order) {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "ada@example.com").await;
        let product = fixtures::product(&db, "deploy", 1250, 5).await;
        let items = vec![NewOrderItem::snapshot(&product, 1)];
        let order = db
            .orders()
            .place_order(
                &NewOrder {
                    order_number: generate_order_number(),
                    user_id: user.id.clone(),
                    payment_method: PaymentMethod::Card,
                    totals: OrderTotals::new(
                        items[0].line_total().unwrap(),
                        Default::default(),
                        Default::default(),
                    )
                    .unwrap(),
                    total_crypto: None,
                    shipping_address: fixtures::address(),
                },
                &items,
            )
            .await
            .unwrap();
        (db, user, order)
    }

    fn grant_for(user: &User, order: &Order, product_id: &str) -> NewDownload {
        NewDownload {
            order_id: order.id.clone(),
            product_id: product_id.to_string(),
            user_id: user.id.clone(),
            download_url: Some("https://cdn.example.com/deploy.zip".to_string()),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_grant_and_list() {
        let (db, user, order) = purchase().await;
        let product_id = db.orders().items(&order.id).await.unwrap()[0].product_id.clone();

        let download = db
            .downloads()
            .grant(&grant_for(&user, &order, &product_id))
            .await
            .unwrap();
        assert_eq!(download.download_count, 0);

        assert_eq!(db.downloads().get(&download.id).await.unwrap(), Some(download.clone()));
        assert_eq!(db.downloads().list_for_user(&user.id).await.unwrap(), vec![download.clone()]);
        assert_eq!(db.downloads().list_for_order(&order.id).await.unwrap(), vec![download]);
    }

    #[tokio::test]
    async fn test_grant_requires_known_product() {
        let (db, user, order) = purchase().await;
        let err = db
            .downloads()
            .grant(&grant_for(&user, &order, "missing"))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_expired_grants_still_count() {
        let (db, user, order) = purchase().await;
        let product_id = db.orders().items(&order.id).await.unwrap()[0].product_id.clone();
        let expired_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut grant = grant_for(&user, &order, &product_id);
        grant.expires_at = Some(expired_at);
        let download = db.downloads().grant(&grant).await.unwrap();
        assert_eq!(download.expires_at, Some(expired_at));
        assert!(download.is_expired(expired_at + Duration::seconds(1)));

        db.downloads().record_download(&download.id).await.unwrap();
        let download = db.downloads().record_download(&download.id).await.unwrap();
        assert_eq!(download.download_count, 2);

        let err = db.downloads().record_download("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
