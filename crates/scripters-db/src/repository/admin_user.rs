//! # Admin User Repository
//!
//! Back-office wallets. Keyed by wallet address.

use scripters_core::validation::{validate_permissions, validate_wallet_address};
use scripters_core::{AdminRole, AdminUser, CoreError, NewAdminUser};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct AdminUserRepository {
    pool: SqlitePool,
}

impl AdminUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminUserRepository { pool }
    }

    /// Registers an admin wallet.
    ///
    /// The address and the permission list are validated first.
    pub async fn insert(&self, admin: &NewAdminUser) -> DbResult<AdminUser> {
        validate_wallet_address(&admin.wallet_address).map_err(CoreError::from)?;
        validate_permissions(&admin.permissions).map_err(CoreError::from)?;

        debug!(wallet = %admin.wallet_address, role = ?admin.role, "Inserting admin user");

        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (wallet_address, role, permissions)
            VALUES (?1, ?2, ?3)
            RETURNING *
            "#,
        )
        .bind(&admin.wallet_address)
        .bind(admin.role)
        .bind(Json(&admin.permissions))
        .fetch_one(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn get(&self, wallet_address: &str) -> DbResult<Option<AdminUser>> {
        let admin =
            sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE wallet_address = ?1")
                .bind(wallet_address)
                .fetch_optional(&self.pool)
                .await?;
        Ok(admin)
    }

    /// All admins, oldest first.
    pub async fn list(&self) -> DbResult<Vec<AdminUser>> {
        let admins = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users ORDER BY created_at, wallet_address",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    /// Stamps `last_login` with the current time.
    pub async fn record_login(&self, wallet_address: &str) -> DbResult<AdminUser> {
        debug!(wallet = %wallet_address, "Recording admin login");

        sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users
            SET last_login = strftime('%Y-%m-%dT%H:%M:%fZ','now')
            WHERE wallet_address = ?1
            RETURNING *
            "#,
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("AdminUser", wallet_address))
    }

    /// Replaces the permission list.
    pub async fn set_permissions(
        &self,
        wallet_address: &str,
        permissions: &[String],
    ) -> DbResult<AdminUser> {
        validate_permissions(permissions).map_err(CoreError::from)?;
        debug!(wallet = %wallet_address, count = permissions.len(), "Setting admin permissions");

        sqlx::query_as::<_, AdminUser>(
            "UPDATE admin_users SET permissions = ?2 WHERE wallet_address = ?1 RETURNING *",
        )
        .bind(wallet_address)
        .bind(Json(permissions))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("AdminUser", wallet_address))
    }

    pub async fn set_role(&self, wallet_address: &str, role: AdminRole) -> DbResult<AdminUser> {
        debug!(wallet = %wallet_address, role = ?role, "Setting admin role");

        sqlx::query_as::<_, AdminUser>(
            "UPDATE admin_users SET role = ?2 WHERE wallet_address = ?1 RETURNING *",
        )
        .bind(wallet_address)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("AdminUser", wallet_address))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;
    use crate::DbError;
    use scripters_core::{AdminRole, NewAdminUser};

    const WALLET: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    fn moderator(permissions: &[&str]) -> NewAdminUser {
        NewAdminUser {
            wallet_address: WALLET.to_string(),
            role: AdminRole::Moderator,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = fixtures::db().await;
        let admin = db
            .admin_users()
            .insert(&moderator(&["products:review"]))
            .await
            .unwrap();

        assert_eq!(admin.permissions, vec!["products:review".to_string()]);
        assert!(admin.last_login.is_none());

        let found = db.admin_users().get(WALLET).await.unwrap().unwrap();
        assert_eq!(found, admin);
        assert_eq!(db.admin_users().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_permissions_are_rejected() {
        let db = fixtures::db().await;
        let err = db
            .admin_users()
            .insert(&moderator(&["orders:read", "orders:read"]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_updates() {
        let db = fixtures::db().await;
        db.admin_users().insert(&moderator(&[])).await.unwrap();

        let admin = db.admin_users().record_login(WALLET).await.unwrap();
        assert!(admin.last_login.is_some());

        let admin = db
            .admin_users()
            .set_permissions(WALLET, &["orders:refund".to_string()])
            .await
            .unwrap();
        assert!(admin.has_permission("orders:refund"));

        let admin = db
            .admin_users()
            .set_role(WALLET, AdminRole::SuperAdmin)
            .await
            .unwrap();
        assert!(admin.has_permission("anything"));
    }

    #[tokio::test]
    async fn test_unknown_wallet() {
        let db = fixtures::db().await;
        let err = db.admin_users().record_login(WALLET).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
