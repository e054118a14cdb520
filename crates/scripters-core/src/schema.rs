//! # Table Declarations
//!
//! Column types, nullability, defaults, uniqueness and foreign keys for every
//! table, as plain `const` data.
//!
//! ## How the pieces fit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  schema.rs (THIS FILE)          migrations/sqlite/*.sql                 │
//! │  ──────────────────────         ───────────────────────                 │
//! │  TableDef / ColumnDef    ◄───►  CREATE TABLE ...                        │
//! │          │                              │                               │
//! │          │                              ▼                               │
//! │          │                      live SQLite schema                      │
//! │          │                              │                               │
//! │          └──────► scripters-db::migrations::verify_schema ◄─┘           │
//! │                   (reports every difference)                            │
//! │                                                                         │
//! │  Table trait: marker type ──► Row (read shape) + Insert (write shape)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The declarations describe the store, they never talk to it. Defaults
//! marked [`ColumnDefault::Now`] are filled by the store at insert time.
//!
//! ## Example
//! ```rust
//! use scripters_core::schema::{self, Insert, Orders, Row, Table};
//!
//! let def = Orders::def();
//! assert_eq!(def.name, "orders");
//! assert!(def.column("order_number").unwrap().unique);
//!
//! // Read and write shapes are inferred from the marker type
//! fn _shapes(_row: Row<Orders>, _insert: Insert<Orders>) {}
//!
//! let items = schema::table("order_items").unwrap();
//! assert_eq!(items.foreign_key("order_id").unwrap().on_delete, schema::OnDelete::Cascade);
//! ```

use crate::entities::{
    AdminUser, Cart, Download, NewAdminUser, NewCart, NewDownload, NewOrder, NewOrderItem,
    NewProduct, NewUser, Order, OrderItem, Product, User,
};

// =============================================================================
// Column Declarations
// =============================================================================

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    /// ISO-8601 UTC text.
    Timestamp,
    /// JSON document stored as text.
    Json,
}

impl ColumnType {
    /// Storage type as SQLite reports it.
    pub const fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text | ColumnType::Timestamp | ColumnType::Json => "TEXT",
        }
    }
}

/// Value the store fills in when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// Current time, ISO-8601 UTC.
    Now,
    /// A literal, written as it appears in SQL (`'draft'`, `0`, `'[]'`).
    Literal(&'static str),
}

impl ColumnDefault {
    /// SQL text of the default expression.
    pub const fn sql(&self) -> &'static str {
        match self {
            ColumnDefault::Now => "strftime('%Y-%m-%dT%H:%M:%fZ','now')",
            ColumnDefault::Literal(sql) => sql,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub const fn json(name: &'static str) -> Self {
        Self::new(name, ColumnType::Json)
    }

    pub const fn not_null(self) -> Self {
        ColumnDef {
            not_null: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        ColumnDef {
            unique: true,
            ..self
        }
    }

    pub const fn default_now(self) -> Self {
        ColumnDef {
            default: Some(ColumnDefault::Now),
            ..self
        }
    }

    pub const fn default_value(self, sql: &'static str) -> Self {
        ColumnDef {
            default: Some(ColumnDefault::Literal(sql)),
            ..self
        }
    }

    /// Whether an insert must supply this column.
    pub const fn required_on_insert(&self) -> bool {
        self.not_null && self.default.is_none()
    }
}

// =============================================================================
// Relations
// =============================================================================

/// Action taken on child rows when the referenced parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
}

impl OnDelete {
    /// Spelling used by `pragma_foreign_key_list`.
    pub const fn sql(&self) -> &'static str {
        match self {
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub column: &'static str,
    pub references: &'static str,
    pub references_column: &'static str,
    pub on_delete: OnDelete,
}

impl ForeignKeyDef {
    pub const fn new(
        column: &'static str,
        references: &'static str,
        references_column: &'static str,
        on_delete: OnDelete,
    ) -> Self {
        ForeignKeyDef {
            column,
            references,
            references_column,
            on_delete,
        }
    }
}

/// A named, non-unique lookup index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub column: &'static str,
}

// =============================================================================
// Table Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
    pub foreign_keys: &'static [ForeignKeyDef],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKeyDef> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Columns with a single-column UNIQUE constraint (primary key excluded).
    pub fn unique_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().filter(|c| c.unique).map(|c| c.name)
    }

    /// Foreign keys in other tables that point at this one.
    pub fn dependents(&self) -> impl Iterator<Item = (&'static TableDef, &'static ForeignKeyDef)> + '_ {
        TABLES.iter().flat_map(move |table| {
            table
                .foreign_keys
                .iter()
                .filter(move |fk| fk.references == self.name)
                .map(move |fk| (*table, fk))
        })
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("email").unique(),
        ColumnDef::text("wallet_address").unique(),
        ColumnDef::text("name"),
        ColumnDef::text("role").not_null().default_value("'customer'"),
        ColumnDef::timestamp("created_at").not_null().default_now(),
        ColumnDef::timestamp("updated_at").not_null().default_now(),
        ColumnDef::timestamp("last_purchase_at"),
    ],
    foreign_keys: &[],
    indexes: &[],
};

pub const ADMIN_USERS: TableDef = TableDef {
    name: "admin_users",
    primary_key: "wallet_address",
    columns: &[
        ColumnDef::text("wallet_address").not_null(),
        ColumnDef::text("role").not_null(),
        ColumnDef::json("permissions").not_null().default_value("'[]'"),
        ColumnDef::timestamp("created_at").not_null().default_now(),
        ColumnDef::timestamp("last_login"),
    ],
    foreign_keys: &[],
    indexes: &[],
};

pub const PRODUCTS: TableDef = TableDef {
    name: "products",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("name").not_null(),
        ColumnDef::text("slug").not_null().unique(),
        ColumnDef::text("description"),
        ColumnDef::integer("price_cents").not_null(),
        ColumnDef::integer("price_eth_units"),
        ColumnDef::integer("price_usdc_cents"),
        ColumnDef::integer("inventory").not_null().default_value("0"),
        ColumnDef::text("category").not_null(),
        ColumnDef::text("status").not_null().default_value("'draft'"),
        ColumnDef::text("license"),
        ColumnDef::text("file_url"),
        ColumnDef::text("file_type"),
        ColumnDef::json("tags").not_null().default_value("'[]'"),
        ColumnDef::json("images").not_null().default_value("'[]'"),
        ColumnDef::timestamp("created_at").not_null().default_now(),
        ColumnDef::timestamp("updated_at").not_null().default_now(),
    ],
    foreign_keys: &[],
    indexes: &[
        IndexDef {
            name: "idx_products_category",
            column: "category",
        },
        IndexDef {
            name: "idx_products_status",
            column: "status",
        },
    ],
};

pub const ORDERS: TableDef = TableDef {
    name: "orders",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("order_number").not_null().unique(),
        ColumnDef::text("user_id").not_null(),
        ColumnDef::text("status").not_null().default_value("'pending'"),
        ColumnDef::text("payment_status").not_null().default_value("'pending'"),
        ColumnDef::text("payment_method").not_null(),
        ColumnDef::text("payment_intent_id"),
        ColumnDef::text("currency"),
        ColumnDef::integer("total_crypto_units"),
        ColumnDef::text("tx_hash").unique(),
        ColumnDef::integer("subtotal_cents").not_null(),
        ColumnDef::integer("tax_cents").not_null().default_value("0"),
        ColumnDef::integer("shipping_cents").not_null().default_value("0"),
        ColumnDef::integer("total_cents").not_null(),
        ColumnDef::json("shipping_address").not_null(),
        ColumnDef::timestamp("created_at").not_null().default_now(),
        ColumnDef::timestamp("updated_at").not_null().default_now(),
    ],
    foreign_keys: &[ForeignKeyDef::new("user_id", "users", "id", OnDelete::NoAction)],
    indexes: &[IndexDef {
        name: "idx_orders_user_id",
        column: "user_id",
    }],
};

pub const ORDER_ITEMS: TableDef = TableDef {
    name: "order_items",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("order_id").not_null(),
        ColumnDef::text("product_id").not_null(),
        ColumnDef::text("product_name").not_null(),
        ColumnDef::integer("quantity").not_null(),
        ColumnDef::integer("unit_price_cents").not_null(),
        ColumnDef::timestamp("created_at").not_null().default_now(),
    ],
    foreign_keys: &[
        ForeignKeyDef::new("order_id", "orders", "id", OnDelete::Cascade),
        ForeignKeyDef::new("product_id", "products", "id", OnDelete::Restrict),
    ],
    indexes: &[IndexDef {
        name: "idx_order_items_order_id",
        column: "order_id",
    }],
};

pub const CARTS: TableDef = TableDef {
    name: "carts",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("user_id").unique(),
        ColumnDef::text("session_id").unique(),
        ColumnDef::json("items").not_null().default_value("'[]'"),
        ColumnDef::timestamp("created_at").not_null().default_now(),
        ColumnDef::timestamp("updated_at").not_null().default_now(),
    ],
    foreign_keys: &[ForeignKeyDef::new("user_id", "users", "id", OnDelete::Cascade)],
    indexes: &[],
};

pub const DOWNLOADS: TableDef = TableDef {
    name: "downloads",
    primary_key: "id",
    columns: &[
        ColumnDef::text("id").not_null(),
        ColumnDef::text("order_id").not_null(),
        ColumnDef::text("product_id").not_null(),
        ColumnDef::text("user_id").not_null(),
        ColumnDef::text("download_url"),
        ColumnDef::timestamp("expires_at"),
        ColumnDef::integer("download_count").not_null().default_value("0"),
        ColumnDef::timestamp("created_at").not_null().default_now(),
    ],
    foreign_keys: &[
        ForeignKeyDef::new("order_id", "orders", "id", OnDelete::Cascade),
        ForeignKeyDef::new("product_id", "products", "id", OnDelete::NoAction),
        ForeignKeyDef::new("user_id", "users", "id", OnDelete::NoAction),
    ],
    indexes: &[IndexDef {
        name: "idx_downloads_user_id",
        column: "user_id",
    }],
};

/// Every table, parents before children.
pub const TABLES: &[&TableDef] = &[
    &USERS,
    &ADMIN_USERS,
    &PRODUCTS,
    &ORDERS,
    &ORDER_ITEMS,
    &CARTS,
    &DOWNLOADS,
];

/// Looks up a table declaration by name.
pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}

// =============================================================================
// Row / Insert Inference
// =============================================================================

/// Ties a table marker to its declaration and its read/write shapes.
pub trait Table {
    /// Shape of a stored row.
    type Row;
    /// Shape accepted on insert; generated ids and store defaults are absent.
    type Insert;

    fn def() -> &'static TableDef;

    fn name() -> &'static str {
        Self::def().name
    }
}

/// Read shape of table `T`.
pub type Row<T> = <T as Table>::Row;

/// Write shape of table `T`.
pub type Insert<T> = <T as Table>::Insert;

macro_rules! table_marker {
    ($(#[$meta:meta])* $marker:ident, $def:ident, $row:ty, $insert:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $marker;

        impl Table for $marker {
            type Row = $row;
            type Insert = $insert;

            fn def() -> &'static TableDef {
                &$def
            }
        }
    };
}

table_marker!(
    /// `users`
    Users, USERS, User, NewUser
);
table_marker!(
    /// `admin_users`
    AdminUsers, ADMIN_USERS, AdminUser, NewAdminUser
);
table_marker!(
    /// `products`
    Products, PRODUCTS, Product, NewProduct
);
table_marker!(
    /// `orders`
    Orders, ORDERS, Order, NewOrder
);
table_marker!(
    /// `order_items`
    OrderItems, ORDER_ITEMS, OrderItem, NewOrderItem
);
table_marker!(
    /// `carts`
    Carts, CARTS, Cart, NewCart
);
table_marker!(
    /// `downloads`
    Downloads, DOWNLOADS, Download, NewDownload
);

// =============================================================================
// Unit Tests
// =============================================================================
