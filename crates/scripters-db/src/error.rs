//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Business rule (CoreError)          │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  DbError::Sqlx  (unmodified)         DbError::Core                      │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │               caller (HTTP layer, seed binary, tests)                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store errors are never rewritten. Callers that care about the kind of
//! constraint that fired ask the error with [`DbError::is_unique_violation`]
//! and friends.

use scripters_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - An update or delete by id touched no row
    /// - A status change on an order that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The row changed between read and write.
    ///
    /// ## When This Occurs
    /// - Two status transitions on the same order race; the loser sees this
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: String },

    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Any error reported by sqlx or SQLite, passed through as-is.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity,
            id: id.into(),
        }
    }

    /// The underlying store error, if any.
    pub fn as_database_error(&self) -> Option<&dyn sqlx::error::DatabaseError> {
        match self {
            DbError::Sqlx(err) => err.as_database_error(),
            _ => None,
        }
    }

    /// UNIQUE (or PRIMARY KEY) constraint failed.
    pub fn is_unique_violation(&self) -> bool {
        self.constraint_matches(ErrorKind::UniqueViolation, "UNIQUE constraint failed")
    }

    /// FOREIGN KEY constraint failed.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.constraint_matches(ErrorKind::ForeignKeyViolation, "FOREIGN KEY constraint failed")
    }

    /// CHECK constraint failed.
    pub fn is_check_violation(&self) -> bool {
        self.constraint_matches(ErrorKind::CheckViolation, "CHECK constraint failed")
    }

    /// Message raised by a trigger or constraint, if this is a store error.
    pub fn database_message(&self) -> Option<&str> {
        self.as_database_error().map(|e| e.message())
    }

    fn constraint_matches(&self, kind: ErrorKind, message: &str) -> bool {
        self.as_database_error()
            .is_some_and(|err| err.kind() == kind || err.message().contains(message))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
