//! # Database Migrations
//!
//! Embedded SQL migrations and the schema drift check.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                        │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql ✓ (already applied)                    │
//! │       └── 002_...                ⬜ (NEW - needs to run)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each one                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  verify_schema: live tables ◄──► scripters_core::schema::TABLES         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones
//! 4. Update `scripters_core::schema` in the same change; `verify_schema`
//!    reports any mismatch

use std::collections::{HashMap, HashSet};
use std::fmt;

use scripters_core::schema::{ColumnDefault, TableDef, TABLES};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns (embedded_migrations, applied_migrations).
///
/// A store that was never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok((total, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

// =============================================================================
// Schema Drift
// =============================================================================

/// One difference between a table declaration and the live store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDrift {
    MissingTable {
        table: &'static str,
    },
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    UnexpectedColumn {
        table: &'static str,
        column: String,
    },
    ColumnType {
        table: &'static str,
        column: &'static str,
        expected: &'static str,
        actual: String,
    },
    Nullability {
        table: &'static str,
        column: &'static str,
        expected_not_null: bool,
    },
    Default {
        table: &'static str,
        column: &'static str,
        expected: Option<&'static str>,
        actual: Option<String>,
    },
    PrimaryKey {
        table: &'static str,
        expected: &'static str,
        actual: Vec<String>,
    },
    MissingUnique {
        table: &'static str,
        column: &'static str,
    },
    ForeignKey {
        table: &'static str,
        column: &'static str,
        expected: String,
        actual: Option<String>,
    },
    MissingIndex {
        table: &'static str,
        index: &'static str,
    },
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDrift::MissingTable { table } => write!(f, "table {} is missing", table),
            SchemaDrift::MissingColumn { table, column } => {
                write!(f, "column {}.{} is missing", table, column)
            }
            SchemaDrift::UnexpectedColumn { table, column } => {
                write!(f, "column {}.{} is not declared", table, column)
            }
            SchemaDrift::ColumnType {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "column {}.{} has type {}, expected {}",
                table, column, actual, expected
            ),
            SchemaDrift::Nullability {
                table,
                column,
                expected_not_null,
            } => write!(
                f,
                "column {}.{} should be {}",
                table,
                column,
                if *expected_not_null { "NOT NULL" } else { "nullable" }
            ),
            SchemaDrift::Default {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "column {}.{} defaults to {}, expected {}",
                table,
                column,
                actual.as_deref().unwrap_or("nothing"),
                expected.unwrap_or("nothing")
            ),
            SchemaDrift::PrimaryKey {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table {} has primary key ({}), expected ({})",
                table,
                actual.join(", "),
                expected
            ),
            SchemaDrift::MissingUnique { table, column } => {
                write!(f, "column {}.{} is not UNIQUE", table, column)
            }
            SchemaDrift::ForeignKey {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "foreign key {}.{} is {}, expected {}",
                table,
                column,
                actual.as_deref().unwrap_or("missing"),
                expected
            ),
            SchemaDrift::MissingIndex { table, index } => {
                write!(f, "index {} on {} is missing", index, table)
            }
        }
    }
}

/// Row of `pragma_table_info`.
#[derive(Debug, sqlx::FromRow)]
struct LiveColumn {
    name: String,
    #[sqlx(rename = "type")]
    ty: String,
    notnull: i64,
    dflt_value: Option<String>,
    pk: i64,
}

/// Row of `pragma_foreign_key_list`.
#[derive(Debug, sqlx::FromRow)]
struct LiveForeignKey {
    from: String,
    table: String,
    to: Option<String>,
    on_delete: String,
}

/// Compares every declared table with the live store.
///
/// ## What Is Compared
/// - Table and column presence (both directions for columns)
/// - Column type, NOT NULL, store default
/// - Primary key column
/// - Single-column UNIQUE constraints
/// - Foreign key target and ON DELETE action
/// - Named lookup indexes
///
/// CHECK constraints and triggers are not inspected.
pub async fn verify_schema(pool: &SqlitePool) -> DbResult<Vec<SchemaDrift>> {
    let mut drift = Vec::new();

    for table in TABLES {
        verify_table(pool, table, &mut drift).await?;
    }

    if drift.is_empty() {
        info!(tables = TABLES.len(), "Schema matches declarations");
    } else {
        for d in &drift {
            warn!(drift = %d, "Schema drift");
        }
    }

    Ok(drift)
}

async fn verify_table(
    pool: &SqlitePool,
    table: &'static TableDef,
    drift: &mut Vec<SchemaDrift>,
) -> DbResult<()> {
    let columns: Vec<LiveColumn> = sqlx::query_as(
        r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#,
    )
    .bind(table.name)
    .fetch_all(pool)
    .await?;

    if columns.is_empty() {
        drift.push(SchemaDrift::MissingTable { table: table.name });
        return Ok(());
    }

    let live: HashMap<&str, &LiveColumn> = columns.iter().map(|c| (c.name.as_str(), c)).collect();

    for declared in table.columns {
        let Some(column) = live.get(declared.name) else {
            drift.push(SchemaDrift::MissingColumn {
                table: table.name,
                column: declared.name,
            });
            continue;
        };

        let expected_type = declared.ty.sql_type();
        if !column.ty.eq_ignore_ascii_case(expected_type) {
            drift.push(SchemaDrift::ColumnType {
                table: table.name,
                column: declared.name,
                expected: expected_type,
                actual: column.ty.clone(),
            });
        }

        if (column.notnull != 0) != declared.not_null {
            drift.push(SchemaDrift::Nullability {
                table: table.name,
                column: declared.name,
                expected_not_null: declared.not_null,
            });
        }

        let expected_default = declared.default.as_ref().map(ColumnDefault::sql);
        let defaults_match = match (expected_default, column.dflt_value.as_deref()) {
            (None, None) => true,
            (Some(expected), Some(actual)) => normalize_sql(expected) == normalize_sql(actual),
            _ => false,
        };
        if !defaults_match {
            drift.push(SchemaDrift::Default {
                table: table.name,
                column: declared.name,
                expected: expected_default,
                actual: column.dflt_value.clone(),
            });
        }
    }

    for column in &columns {
        if table.column(&column.name).is_none() {
            drift.push(SchemaDrift::UnexpectedColumn {
                table: table.name,
                column: column.name.clone(),
            });
        }
    }

    let pk: Vec<String> = columns
        .iter()
        .filter(|c| c.pk > 0)
        .map(|c| c.name.clone())
        .collect();
    if pk.len() != 1 || pk[0] != table.primary_key {
        drift.push(SchemaDrift::PrimaryKey {
            table: table.name,
            expected: table.primary_key,
            actual: pk,
        });
    }

    verify_unique(pool, table, drift).await?;
    verify_foreign_keys(pool, table, drift).await?;
    verify_indexes(pool, table, drift).await?;

    Ok(())
}

async fn verify_unique(
    pool: &SqlitePool,
    table: &'static TableDef,
    drift: &mut Vec<SchemaDrift>,
) -> DbResult<()> {
    let unique: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT MAX(ii.name)
        FROM pragma_index_list(?1) AS il, pragma_index_info(il.name) AS ii
        WHERE il."unique" = 1 AND il.origin != 'pk'
        GROUP BY il.name
        HAVING COUNT(*) = 1
        "#,
    )
    .bind(table.name)
    .fetch_all(pool)
    .await?;

    let unique: HashSet<&str> = unique.iter().map(String::as_str).collect();
    for column in table.unique_columns() {
        if !unique.contains(column) {
            drift.push(SchemaDrift::MissingUnique {
                table: table.name,
                column,
            });
        }
    }
    Ok(())
}

async fn verify_foreign_keys(
    pool: &SqlitePool,
    table: &'static TableDef,
    drift: &mut Vec<SchemaDrift>,
) -> DbResult<()> {
    let live: Vec<LiveForeignKey> = sqlx::query_as(
        r#"SELECT "from", "table", "to", on_delete FROM pragma_foreign_key_list(?1)"#,
    )
    .bind(table.name)
    .fetch_all(pool)
    .await?;

    for fk in table.foreign_keys {
        let expected = format!(
            "{}({}) ON DELETE {}",
            fk.references,
            fk.references_column,
            fk.on_delete.sql()
        );
        let actual = live.iter().find(|l| l.from == fk.column).map(|l| {
            format!(
                "{}({}) ON DELETE {}",
                l.table,
                l.to.as_deref().unwrap_or(""),
                l.on_delete.to_uppercase()
            )
        });
        if actual.as_deref() != Some(expected.as_str()) {
            drift.push(SchemaDrift::ForeignKey {
                table: table.name,
                column: fk.column,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

async fn verify_indexes(
    pool: &SqlitePool,
    table: &'static TableDef,
    drift: &mut Vec<SchemaDrift>,
) -> DbResult<()> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_index_list(?1)")
        .bind(table.name)
        .fetch_all(pool)
        .await?;

    for index in table.indexes {
        if !names.iter().any(|n| n == index.name) {
            drift.push(SchemaDrift::MissingIndex {
                table: table.name,
                index: index.name,
            });
        }
    }
    Ok(())
}

/// `(strftime('%Y', 'now'))` and `strftime('%Y','now')` compare equal.
fn normalize_sql(sql: &str) -> String {
    let mut s = sql.trim();
    while s.starts_with('(') && s.ends_with(')') {
        s = s[1..s.len() - 1].trim();
    }
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
