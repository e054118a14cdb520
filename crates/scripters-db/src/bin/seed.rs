//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by DATABASE_URL
//! DATABASE_URL=sqlite:./scripters_dev.db cargo run -p scripters-db --bin seed
//!
//! # Limit the catalog size
//! cargo run -p scripters-db --bin seed -- --count 20
//!
//! # Specify database URL
//! cargo run -p scripters-db --bin seed -- --db sqlite:./data/shop.db
//! ```
//!
//! ## Generated Data
//! - Products across scripts, themes and plugins, one per license tier,
//!   each passing through the same validation as admin input
//! - One demo customer and one super admin wallet
//! - One paid demo order with a download grant
//!
//! Each product has:
//! - Slug: `{name}-{license}`
//! - Fiat price from its base price and license tier
//! - USDC price equal to the fiat price, ETH price at a fixed demo rate
//! - Stock 0 - 50

use scripters_core::format::{format_price, generate_order_number, truncate_address};
use scripters_core::validation::validate_product;
use scripters_core::{
    AdminRole, CryptoAmount, CryptoCurrency, Money, NewAdminUser, NewDownload, NewOrder,
    NewOrderItem, NewProduct, NewUser, OrderTotals, PaymentMethod, Product, ProductLicense,
    ProductStatus, ShippingAddress, DEFAULT_ADDRESS_CHARS,
};
use scripters_db::migrations::migration_status;
use scripters_db::{Database, DbConfig};
use serde_json::json;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Catalog categories: (category, [(name, base price in cents, tags)])
const CATEGORIES: &[(&str, &[(&str, i64, &[&str])])] = &[
    (
        "scripts",
        &[
            ("Deploy Pipeline", 2900, &["devops", "bash"]),
            ("Backup Rotator", 1900, &["devops", "storage"]),
            ("Log Shipper", 2400, &["observability"]),
            ("Cert Renewer", 1500, &["tls", "cron"]),
            ("DB Snapshotter", 3400, &["postgres", "storage"]),
        ],
    ),
    (
        "themes",
        &[
            ("Midnight Admin", 4900, &["dark", "dashboard"]),
            ("Paper Storefront", 3900, &["light", "shop"]),
            ("Terminal Docs", 2900, &["docs", "mono"]),
        ],
    ),
    (
        "plugins",
        &[
            ("Wallet Connect Button", 1200, &["web3", "ui"]),
            ("Invoice Exporter", 2200, &["pdf", "billing"]),
            ("Rate Limiter", 1800, &["api"]),
            ("Image Optimizer", 900, &["media"]),
        ],
    ),
];

/// License tiers and their price multiplier in percent
const LICENSES: &[(ProductLicense, &str, i64)] = &[
    (ProductLicense::Single, "single", 100),
    (ProductLicense::Unlimited, "unlimited", 250),
    (ProductLicense::Commercial, "commercial", 500),
];

/// Demo ETH price: cents per ETH
const CENTS_PER_ETH: i64 = 250_000;

const DEMO_WALLET: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
const ADMIN_WALLET: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";

const DEFAULT_FILTER: &str = "info,scripters=debug,sqlx=warn";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_url: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = parse_count(&args[i + 1])?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_url = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Scripters Shop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: full catalog)");
                println!("  -d, --db <URL>     Database URL (default: $DATABASE_URL)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = match db_url {
        Some(url) => DbConfig::new(url),
        None => DbConfig::from_env()?,
    };

    info!(url = %config.database_url, "Seeding database");
    let db = Database::new(config).await?;

    let (embedded, applied) = migration_status(db.pool()).await?;
    info!(embedded, applied, "Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let products = seed_catalog(&db, count).await?;
    let elapsed = start.elapsed();
    info!(count = products.len(), ?elapsed, "Catalog seeded");

    if let Some(product) = products.first() {
        seed_demo_order(&db, product).await?;
    }

    let drift = db.verify_schema().await?;
    if drift.is_empty() {
        info!("Seed complete");
    } else {
        warn!(differences = drift.len(), "Seed complete, but the schema has drifted");
    }

    db.close().await;
    Ok(())
}

fn parse_count(value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|e| format!("invalid --count value '{}': {}", value, e))
}

/// Inserts up to `limit` products. Each goes through admin input validation.
async fn seed_catalog(db: &Database, limit: usize) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    let mut products = Vec::new();
    let mut seq = 0usize;

    for (category, entries) in CATEGORIES {
        for (name, base_cents, tags) in entries.iter() {
            for (license, license_name, multiplier) in LICENSES {
                if products.len() >= limit {
                    return Ok(products);
                }

                let new = generate_product(category, name, *base_cents, tags, *license, license_name, *multiplier, seq)?;
                seq += 1;

                match db.products().insert(&new).await {
                    Ok(product) => {
                        info!(
                            slug = %product.slug,
                            price = %format_price(product.price())?,
                            "Seeded product"
                        );
                        products.push(product);
                    }
                    Err(e) => warn!(slug = %new.slug, error = %e, "Failed to insert product"),
                }
            }
        }
    }

    Ok(products)
}

/// Builds one product from an admin-style JSON document.
#[allow(clippy::too_many_arguments)]
fn generate_product(
    category: &str,
    name: &str,
    base_cents: i64,
    tags: &[&str],
    license: ProductLicense,
    license_name: &str,
    multiplier: i64,
    seq: usize,
) -> Result<NewProduct, Box<dyn std::error::Error>> {
    let price_cents = base_cents * multiplier / 100;
    let slug = format!("{}-{}", name.to_lowercase().replace(' ', "-"), license_name);

    let input = validate_product(&json!({
        "name": format!("{} ({})", name, license_name),
        "slug": slug,
        "description": format!("{} for {} use", name, license_name),
        "price": Money::from_cents(price_cents).to_decimal(),
        "inventory": (seq * 7) % 51,
        "category": category,
    }))?;

    let mut product = NewProduct::try_from(input)?;
    product.status = ProductStatus::Active;
    product.license = Some(license);
    product.tags = tags.iter().map(|t| t.to_string()).collect();
    product.file_type = Some("zip".to_string());
    product.file_url = Some(format!("https://cdn.example.com/{}.zip", product.slug));
    product.price_usdc = Some(CryptoAmount::from_units(price_cents, CryptoCurrency::Usdc));
    // 1e8 units per ETH
    product.price_eth = Some(CryptoAmount::from_units(
        price_cents * 100_000_000 / CENTS_PER_ETH,
        CryptoCurrency::Eth,
    ));

    Ok(product)
}

/// One customer, one admin, and a paid crypto order with a download grant.
async fn seed_demo_order(db: &Database, product: &Product) -> Result<(), Box<dyn std::error::Error>> {
    let customer = db
        .users()
        .insert(&NewUser {
            email: Some("demo@scripters.shop".to_string()),
            wallet_address: Some(DEMO_WALLET.to_string()),
            name: Some("Demo Customer".to_string()),
            ..NewUser::default()
        })
        .await?;

    db.admin_users()
        .insert(&NewAdminUser {
            wallet_address: ADMIN_WALLET.to_string(),
            role: AdminRole::SuperAdmin,
            permissions: Vec::new(),
        })
        .await?;
    info!(
        admin = %truncate_address(ADMIN_WALLET, DEFAULT_ADDRESS_CHARS),
        "Seeded admin wallet"
    );

    let items = vec![NewOrderItem::snapshot(product, 1)];
    let subtotal = items[0].line_total()?;
    let order = db
        .orders()
        .place_order(
            &NewOrder {
                order_number: generate_order_number(),
                user_id: customer.id.clone(),
                payment_method: PaymentMethod::Crypto,
                totals: OrderTotals::new(subtotal, Money::zero(), Money::zero())?,
                total_crypto: Some(CryptoAmount::from_units(subtotal.cents(), CryptoCurrency::Usdc)),
                shipping_address: ShippingAddress {
                    name: "Demo Customer".to_string(),
                    address: "1 Market Street".to_string(),
                    city: "San Francisco".to_string(),
                    state: "CA".to_string(),
                    zip: "94105".to_string(),
                    country: "US".to_string(),
                },
            },
            &items,
        )
        .await?;

    db.orders()
        .record_crypto_payment(
            &order.id,
            "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
        )
        .await?;

    db.downloads()
        .grant(&NewDownload {
            order_id: order.id.clone(),
            product_id: product.id.clone(),
            user_id: customer.id.clone(),
            download_url: product.file_url.clone(),
            expires_at: None,
        })
        .await?;

    info!(
        order_number = %order.order_number,
        customer = %truncate_address(DEMO_WALLET, DEFAULT_ADDRESS_CHARS),
        "Seeded demo order"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("20"), Ok(20));
        assert_eq!(parse_count("0"), Ok(0));

        let err = parse_count("twenty").unwrap_err();
        assert!(err.contains("'twenty'"));
        assert!(parse_count("-1").is_err());
        assert!(parse_count("").is_err());
    }
}
