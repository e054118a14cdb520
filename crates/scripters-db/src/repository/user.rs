//! # User Repository
//!
//! Storefront accounts.
//!
//! `id` and a linked `wallet_address` never change; the store rejects such
//! updates with `RAISE(ABORT, ...)` from a trigger, surfaced unmodified as
//! [`DbError::Sqlx`](crate::DbError::Sqlx).

use scripters_core::schema::Users;
use scripters_core::validation::{validate_email, validate_wallet_address};
use scripters_core::{new_id, CoreError, NewUser, User, UserRole};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::count_rows;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Ok(User)` - Stored row with generated id and defaults
    /// * `Err(DbError::Core)` - Malformed email or wallet address
    /// * `Err(DbError::Sqlx)` - Email or wallet already taken (`is_unique_violation`)
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        if let Some(email) = &user.email {
            validate_email(email).map_err(CoreError::from)?;
        }
        if let Some(wallet) = &user.wallet_address {
            validate_wallet_address(wallet).map_err(CoreError::from)?;
        }

        let id = new_id();
        debug!(id = %id, role = ?user.role, "Inserting user");

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, wallet_address, name, role)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.wallet_address)
        .bind(&user.name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_wallet(&self, wallet_address: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE wallet_address = ?1")
            .bind(wallet_address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn set_role(&self, id: &str, role: UserRole) -> DbResult<User> {
        debug!(id = %id, role = ?role, "Setting user role");

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Links a wallet to an account that has none.
    ///
    /// Re-linking the same address is a no-op; a different address is
    /// rejected by the store.
    pub async fn link_wallet(&self, id: &str, wallet_address: &str) -> DbResult<User> {
        validate_wallet_address(wallet_address).map_err(CoreError::from)?;
        debug!(id = %id, wallet = %wallet_address, "Linking wallet");

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET wallet_address = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn count(&self) -> DbResult<i64> {
        count_rows::<Users>(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;
    use scripters_core::{NewUser, UserRole};

    const WALLET_A: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
    const WALLET_B: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";

    #[tokio::test]
    async fn test_insert_applies_store_defaults() {
        let db = fixtures::db().await;
        let user = db
            .users()
            .insert(&NewUser {
                email: Some("ada@example.com".to_string()),
                ..NewUser::default()
            })
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Customer);
        assert!(user.last_purchase_at.is_none());
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookups() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "ada@example.com").await;

        let by_id = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id, user);
        let by_email = db.users().get_by_email("ada@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);
        assert!(db.users().get_by_wallet(WALLET_A).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_unique_violation() {
        let db = fixtures::db().await;
        fixtures::user(&db, "ada@example.com").await;

        let err = db
            .users()
            .insert(&NewUser {
                email: Some("ada@example.com".to_string()),
                ..NewUser::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_before_the_store() {
        let db = fixtures::db().await;
        let err = db
            .users()
            .insert(&NewUser {
                email: Some("not-an-email".to_string()),
                ..NewUser::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::Core(_)));
        assert_eq!(db.users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wallet_links_once() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "ada@example.com").await;

        let linked = db.users().link_wallet(&user.id, WALLET_A).await.unwrap();
        assert_eq!(linked.wallet_address.as_deref(), Some(WALLET_A));

        // same address again is fine
        db.users().link_wallet(&user.id, WALLET_A).await.unwrap();

        let err = db.users().link_wallet(&user.id, WALLET_B).await.unwrap_err();
        assert_eq!(err.database_message(), Some("wallet_address is immutable"));

        let found = db.users().get_by_wallet(WALLET_A).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_set_role() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "ada@example.com").await;

        let vendor = db.users().set_role(&user.id, UserRole::Vendor).await.unwrap();
        assert_eq!(vendor.role, UserRole::Vendor);

        let err = db.users().set_role("missing", UserRole::Admin).await.unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }
}
