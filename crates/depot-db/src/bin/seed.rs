//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and runs a sample order flow.
//!
//! ## Usage
//! ```bash
//! # Seed ./depot_dev.db
//! cargo run -p depot-db --bin seed
//!
//! # Specify database path (otherwise DEPOT_DB_PATH, then ./depot_dev.db)
//! cargo run -p depot-db --bin seed -- --db ./data/depot.db
//!
//! # More engine logging
//! RUST_LOG=depot=debug cargo run -p depot-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Suppliers and consumers with valid contact numbers and emails
//! - Products, each linked to one or two suppliers
//! - One stock row per product at the default location
//! - A consumer order large enough to spawn a compensating supplier order,
//!   then a shrink of that order, plus settlements for both sides

use std::env;

use depot_core::{
    Money, NewConsumerOrder, NewProduct, NewStock, OrderUpdate, PartyDraft, DEFAULT_LOCATION,
};
use depot_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (name, address, contact, email)
const SUPPLIERS: &[(&str, &str, &str, &str)] = &[
    ("Vetri Traders", "12 Anna Salai, Chennai", "+914428150000", "orders@vetritraders.in"),
    ("Kaveri Imports", "4 MG Road, Bengaluru", "+918041230000", "supply@kaveri-imports.com"),
    ("Lotus Wholesale", "88 Park Street, Kolkata", "03322290000", "sales@lotuswholesale.in"),
];

const CONSUMERS: &[(&str, &str, &str, &str)] = &[
    ("Meena Stores", "3 Gandhi Nagar, Madurai", "+919443000001", "meena.stores@example.in"),
    ("Arun Electronics", "21 Ring Road, Coimbatore", "9843000002", "arun@arun-electronics.in"),
];

/// (name, description, unit price, initial stock, threshold, supplier indexes)
const PRODUCTS: &[(&str, &str, &str, i64, i64, &[usize])] = &[
    ("iPhone", "Smartphone", "999.00", 5, 3, &[0, 1]),
    ("Laptop", "14-inch ultrabook", "1500.00", 12, 4, &[1]),
    ("Headphones", "Wireless, noise cancelling", "25.50", 40, 10, &[0, 2]),
    ("Desk Lamp", "LED, dimmable", "12.50", 25, 5, &[2]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env()?;
    if env::var("DEPOT_DB_PATH").is_err() {
        config.database_path = "./depot_dev.db".into();
    }

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Depot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./depot_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Depot Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Parties
    let mut supplier_ids = Vec::new();
    for (name, address, contact, email) in SUPPLIERS {
        let supplier = db.suppliers().create(draft(name, address, contact, email)).await?;
        supplier_ids.push(supplier.id);
    }
    let mut consumer_ids = Vec::new();
    for (name, address, contact, email) in CONSUMERS {
        let consumer = db.consumers().create(draft(name, address, contact, email)).await?;
        consumer_ids.push(consumer.id);
    }
    println!("✓ {} suppliers, {} consumers", supplier_ids.len(), consumer_ids.len());

    // Catalog + stock
    let mut product_ids = Vec::new();
    for (name, description, price, quantity, threshold, suppliers) in PRODUCTS {
        let unit_price: Money = price.parse()?;
        let product = db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                description: Some(description.to_string()),
                unit_price,
            })
            .await?;

        for &idx in suppliers.iter() {
            db.products().link_supplier(&product.id, &supplier_ids[idx]).await?;
        }

        db.stocks()
            .create(NewStock {
                product_id: product.id.clone(),
                quantity: *quantity,
                location: DEFAULT_LOCATION.to_string(),
                threshold: *threshold,
            })
            .await?;

        product_ids.push(product.id);
    }
    println!("✓ {} products with stock", product_ids.len());

    // Sample flow: 8 iPhones against 5 on hand (threshold 3)
    println!();
    println!("Running sample order flow...");

    let cascade = db.cascade();
    let order = cascade
        .create_consumer_order(NewConsumerOrder {
            consumer_id: consumer_ids[0].clone(),
            product_id: product_ids[0].clone(),
            quantity: 8,
            order_date: None,
        })
        .await?;
    report_stock(&db, &order.stock_id, "after ordering 8").await?;

    if let Some(compensating) = db.supplier_orders().compensating_for(&order.id).await? {
        println!(
            "  Compensating supplier order: {} units for {}",
            compensating.quantity,
            compensating.total_price()
        );
        db.recorder()
            .create_supplier_transaction(&compensating.supplier_id, &compensating.id, None)
            .await?;
    }

    let order = cascade
        .update_consumer_order(
            &order.id,
            OrderUpdate {
                quantity: Some(2),
                order_date: None,
            },
        )
        .await?;
    report_stock(&db, &order.stock_id, "after shrinking to 2").await?;

    let settlement = db
        .recorder()
        .create_consumer_transaction(&order.consumer_id, &order.id, None)
        .await?;
    println!("  Consumer settlement: {}", settlement.amount());

    info!(
        products = product_ids.len(),
        supplier_orders = db.supplier_orders().list().await?.len(),
        consumer_orders = db.consumer_orders().list().await?.len(),
        "Seed complete"
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn draft(name: &str, address: &str, contact: &str, email: &str) -> PartyDraft {
    PartyDraft {
        name: name.to_string(),
        address: address.to_string(),
        contact: contact.to_string(),
        email: email.to_string(),
    }
}

async fn report_stock(db: &Database, stock_id: &str, label: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(stock) = db.stocks().get(stock_id).await? {
        println!("  Stock {}: {} (threshold {})", label, stock.quantity, stock.threshold);
    }
    Ok(())
}

/// Installs the tracing subscriber.
///
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,depot=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
