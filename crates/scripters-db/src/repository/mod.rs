//! # Repository Module
//!
//! One repository per table.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.orders().place_order(&new_order, &items)                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── place_order   (one transaction)                                    │
//! │  ├── get_by_id / get_by_order_number / items                            │
//! │  ├── transition_status / transition_payment_status (gated)              │
//! │  └── delete        (cascades to items + downloads)                      │
//! │       │                                                                 │
//! │       │  SQL (runtime queries, RETURNING *)                             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository holds a clone of the pool; cloning is cheap.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, roles, wallet linking
//! - [`AdminUserRepository`] - Back-office wallets and permissions
//! - [`ProductRepository`] - Catalog CRUD, pricing, inventory
//! - [`OrderRepository`] - Placement, lifecycle, payments
//! - [`CartRepository`] - Embedded item lists per user or session
//! - [`DownloadRepository`] - Download grants and counters

pub mod admin_user;
pub mod cart;
pub mod download;
pub mod order;
pub mod product;
pub mod user;

pub use admin_user::AdminUserRepository;
pub use cart::CartRepository;
pub use download::DownloadRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

use scripters_core::schema::Table;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Row count of table `T`.
pub(crate) async fn count_rows<T: Table>(pool: &SqlitePool) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", T::name());
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use scripters_core::{
        Money, NewProduct, NewUser, Product, ProductStatus, ShippingAddress, User,
    };

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, email: &str) -> User {
        db.users()
            .insert(&NewUser {
                email: Some(email.to_string()),
                name: Some("Ada".to_string()),
                ..NewUser::default()
            })
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, slug: &str, price_cents: i64, inventory: i64) -> Product {
        let mut new = NewProduct::new(
            format!("Script {}", slug),
            slug,
            Money::from_cents(price_cents),
            inventory,
            "scripts",
        );
        new.status = ProductStatus::Active;
        db.products().insert(&new).await.unwrap()
    }

    pub fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ada Lovelace".to_string(),
            address: "12 Analytical Way".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip: "78701".to_string(),
            country: "US".to_string(),
        }
    }
}
