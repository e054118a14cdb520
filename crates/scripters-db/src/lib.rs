//! # scripters-db: Database Layer for Scripters Shop
//!
//! This crate provides database access for the storefront.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scripters Shop Data Flow                           │
//! │                                                                         │
//! │  Request handler (checkout, admin product form, ...)                    │
//! │       │  validated with scripters_core::validation                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   scripters-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ SqlitePool    │    │ UserRepo      │    │ 001_initial_ │   │   │
//! │  │   │ Connection    │◄───│ ProductRepo   │    │ schema.sql   │   │   │
//! │  │   │ Management    │    │ OrderRepo ... │    │ drift check  │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   foreign keys ON, WAL journal                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations and schema drift check
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scripters_db::{Database, DbConfig};
//!
//! // Connect and migrate
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! // Use repositories
//! let product = db.products().get_by_slug("deploy-pipeline-single").await?;
//! let order = db.orders().place_order(&new_order, &items).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::SchemaDrift;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AdminUserRepository, CartRepository, DownloadRepository, OrderRepository, ProductRepository,
    UserRepository,
};
