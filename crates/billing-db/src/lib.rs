//! # billing-db: Database Layer for OM Billing
//!
//! SQLite storage, the unit of work, the Inventory Ledger and the
//! Transaction Recorder.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OM Billing Data Flow                             │
//! │                                                                         │
//! │  Form action (Add Sale, Create Order, ...)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    billing-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │  Database    │   │  Transaction  │   │  Repositories    │  │   │
//! │  │   │  (pool.rs)   │   │  Recorder     │──►│  InventoryLedger │  │   │
//! │  │   │  SqlitePool  │   │  (one unit of │   │  Purchases/Sales │  │   │
//! │  │   │  migrations  │   │   work/call)  │   │  SaleOrders ...  │  │   │
//! │  │   └──────────────┘   └───────────────┘   └──────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   items • stakeholders • purchases • sales • sale_orders • ...  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`unit_of_work`] - One transaction shared by a recording operation
//! - [`repository`] - Inventory Ledger and per-table repositories
//! - [`recorder`] - Purchases, sales and sale orders
//! - [`report`] - Dashboard aggregates
//! - [`settings`] - Configuration from environment variables
//! - [`error`] - Storage errors and the caller-facing error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billing_db::{BillingConfig, Database};
//!
//! let config = BillingConfig::from_env();
//! let db = Database::new(config.db).await?;
//!
//! let sale = db.recorder(config.recorder).record_sale(&new_sale).await?;
//! let stock = db.inventory().get_item(sale.item_id).await?.stock_qty;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod recorder;
pub mod report;
pub mod repository;
pub mod settings;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{BillingError, BillingResult, DbError, DbResult, ErrorKind};
pub use pool::{Database, DbConfig};
pub use recorder::TransactionRecorder;
pub use report::ReportRepository;
pub use settings::BillingConfig;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::{
    InventoryLedger, PurchaseRepository, SaleOrderRepository, SaleRepository,
    StakeholderRepository,
};
