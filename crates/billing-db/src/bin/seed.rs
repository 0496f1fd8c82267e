//! # Seed Data Generator
//!
//! Fills a database with demo items, stakeholders and a month of
//! transactions for development.
//!
//! ## Usage
//! ```bash
//! # Seed $BILLING_DB_PATH (default ./om_billing.db)
//! cargo run -p billing-db --bin seed
//!
//! # Specify database path
//! cargo run -p billing-db --bin seed -- --db ./data/om_billing.db
//!
//! # More detail
//! RUST_LOG=debug cargo run -p billing-db --bin seed
//! ```
//!
//! Everything goes through the public operations (add_item, record_purchase,
//! record_sale, create_sale_order), so stock levels end up consistent with
//! the ledgers.

use billing_core::{
    Money, NewItem, NewPurchase, NewSale, NewSaleOrder, NewStakeholder, OrderLine,
    StakeholderRole,
};
use billing_db::{BillingConfig, Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

/// (name, sale price in cents, opening stock, minimum level)
const ITEMS: &[(&str, i64, i64, i64)] = &[
    ("Basmati Rice 5kg", 65_000, 20, 5),
    ("Sunflower Oil 1L", 18_500, 40, 10),
    ("Wheat Flour 10kg", 42_000, 15, 5),
    ("Sugar 1kg", 5_200, 60, 20),
    ("Tea Leaves 500g", 27_500, 25, 8),
    ("Red Lentils 1kg", 14_000, 30, 10),
    ("Table Salt 1kg", 2_800, 80, 25),
    ("Detergent 2kg", 31_000, 12, 4),
];

/// (name, contact, address, role, discount in bps)
const STAKEHOLDERS: &[(&str, &str, &str, StakeholderRole, u32)] = &[
    ("Metro Wholesale", "0300-1112233", "Plot 12, Industrial Area", StakeholderRole::Seller, 0),
    ("Green Valley Traders", "0321-4445566", "Shop 4, Grain Market", StakeholderRole::Seller, 0),
    ("Al-Noor General Store", "0333-7778899", "Main Bazaar", StakeholderRole::Buyer, 500),
    ("City Mart", "0345-1231231", "Block C, Model Town", StakeholderRole::Buyer, 1000),
    ("Walk-in Customer", "", "", StakeholderRole::Buyer, 0),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,billing=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = BillingConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("OM Billing Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $BILLING_DB_PATH or ./om_billing.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 OM Billing Seed Data Generator");
    println!("=================================");
    println!("Database: {}", config.db.database_path.display());
    println!();

    let db = Database::new(config.db).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.inventory().get_all_items().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} items", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Items
    let mut items = Vec::with_capacity(ITEMS.len());
    for (name, price, stock, min) in ITEMS {
        let item = db
            .inventory()
            .add_item(&NewItem {
                name: name.to_string(),
                sale_price_cents: *price,
                stock_qty: *stock,
                min_stock_level: *min,
            })
            .await?;
        items.push(item);
    }
    println!("✓ {} items", items.len());

    // Stakeholders
    let mut sellers = Vec::new();
    let mut buyers = Vec::new();
    for (name, contact, address, role, discount_bps) in STAKEHOLDERS {
        let stakeholder = db
            .stakeholders()
            .add(&NewStakeholder {
                name: name.to_string(),
                contact_number: contact.to_string(),
                address: address.to_string(),
                role: *role,
                discount_bps: *discount_bps,
            })
            .await?;
        match stakeholder.role {
            StakeholderRole::Seller => sellers.push(stakeholder),
            StakeholderRole::Buyer => buyers.push(stakeholder),
        }
    }
    println!("✓ {} sellers, {} buyers", sellers.len(), buyers.len());

    let recorder = db.recorder(config.recorder);
    let now = Utc::now();

    // Restock every item at ~70% of its sale price over the last three weeks
    for (idx, item) in items.iter().enumerate() {
        let seller = &sellers[idx % sellers.len()];
        recorder
            .record_purchase(&NewPurchase {
                item_id: item.item_id,
                quantity: 10 + (idx as i64 * 3) % 15,
                unit_price_cents: item.sale_price_cents * 7 / 10,
                date: Some(now - Duration::days(21 - idx as i64)),
                seller_id: Some(seller.stakeholder_id),
            })
            .await?;
    }
    println!("✓ {} purchases", items.len());

    // Single-line sales, buyer discount applied to the price
    let mut sales = 0;
    for (idx, item) in items.iter().enumerate().filter(|(idx, _)| idx % 2 == 0) {
        let buyer = &buyers[idx % buyers.len()];
        let price = db
            .stakeholders()
            .discounted_price(item.sale_price(), buyer.stakeholder_id)
            .await?;
        recorder
            .record_sale(&NewSale {
                item_id: item.item_id,
                quantity: 1 + idx as i64 % 4,
                unit_price_cents: price.cents(),
                date: Some(now - Duration::days(10 - idx as i64)),
                buyer_id: Some(buyer.stakeholder_id),
            })
            .await?;
        sales += 1;
    }
    println!("✓ {} sales", sales);

    // Two multi-line orders
    for (n, buyer) in buyers.iter().take(2).enumerate() {
        let lines = items
            .iter()
            .skip(n)
            .step_by(3)
            .map(|item| OrderLine {
                item_id: item.item_id,
                quantity: 2,
                unit_price_cents: item.sale_price_cents,
            })
            .collect();

        let order = recorder
            .create_sale_order(&NewSaleOrder {
                buyer_id: Some(buyer.stakeholder_id),
                order_date: Some(now - Duration::hours(n as i64 + 1)),
                notes: Some(format!("Weekly order for {}", buyer.name)),
                lines,
            })
            .await?;
        println!(
            "✓ Order {} for {}: {}",
            order.order_number,
            buyer.name,
            order.grand_total().format_with("Rs ")
        );
    }

    let summary = db
        .reports()
        .dashboard(now, recorder.config())
        .await?;

    println!();
    let rupees = |cents: i64| Money::from_cents(cents).format_with("Rs ");
    println!(
        "Dashboard ({} to {})",
        summary.period.start.date_naive(),
        summary.period.end.date_naive()
    );
    println!("  Purchases this month: {}", rupees(summary.purchases_cents));
    println!("  Sales this month:     {}", rupees(summary.sales_cents));
    println!("  Balance:              {}", rupees(summary.balance_cents));
    println!("  Units in stock:       {}", summary.total_stock);
    println!("  Recent transactions:  {}", summary.recent.len());

    let low = db.inventory().low_stock_items().await?;
    if !low.is_empty() {
        println!("  Low stock:            {}", low.len());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
