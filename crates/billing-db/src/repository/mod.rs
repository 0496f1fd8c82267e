//! # Repository Module
//!
//! Database repository implementations for OM Billing.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │       │  db.inventory().get_item(7)                                     │
//! │       ▼                                                                 │
//! │  InventoryLedger                                                        │
//! │  ├── get_item(&self, id)                 ← reads on the pool            │
//! │  ├── add_item / update_item / delete_item                               │
//! │  └── adjust_stock(&self, &mut uow, ..)   ← writes inside a unit of work │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Methods that take `&mut UnitOfWork` never open or finish a transaction
//! themselves; the Transaction Recorder owns that boundary.
//!
//! ## Available Repositories
//!
//! - [`InventoryLedger`] - Items and stock
//! - [`StakeholderRepository`] - Buyers and sellers
//! - [`PurchaseRepository`] - Purchase rows and purchase totals
//! - [`SaleRepository`] - Sale rows and sale totals
//! - [`SaleOrderRepository`] - Sale order headers and lines

pub mod inventory;
pub mod order;
pub mod purchase;
pub mod sale;
pub mod stakeholder;

pub use inventory::InventoryLedger;
pub use order::SaleOrderRepository;
pub use purchase::PurchaseRepository;
pub use sale::SaleRepository;
pub use stakeholder::StakeholderRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use billing_core::{Item, NewItem, NewStakeholder, Stakeholder, StakeholderRole};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn widget(db: &Database) -> Item {
        item(db, "Widget", 1000, 5, 2).await
    }

    pub async fn item(db: &Database, name: &str, price: i64, stock: i64, min: i64) -> Item {
        db.inventory()
            .add_item(&NewItem {
                name: name.to_string(),
                sale_price_cents: price,
                stock_qty: stock,
                min_stock_level: min,
            })
            .await
            .unwrap()
    }

    pub async fn stakeholder(
        db: &Database,
        name: &str,
        role: StakeholderRole,
        discount_bps: u32,
    ) -> Stakeholder {
        db.stakeholders()
            .add(&NewStakeholder {
                name: name.to_string(),
                contact_number: "555-0100".to_string(),
                address: "1 Market Road".to_string(),
                role,
                discount_bps,
            })
            .await
            .unwrap()
    }
}
