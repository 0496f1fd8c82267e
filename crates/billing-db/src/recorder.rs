//! # Transaction Recorder
//!
//! Records purchases, sales and sale orders. Each call is one unit of work
//! spanning the transaction rows and the matching stock adjustments.
//!
//! ## Call Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► UnitOfWorkOpen ──► { Writing ──► StockAdjusting }* ─┐   │
//! │      │                                      │                       │   │
//! │      │ ValidationError                      │ any error             │   │
//! │      ▼                                      ▼                       ▼   │
//! │  (nothing opened)                      RolledBack(error)        Committed│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sale Order Flow
//! ```text
//! create_sale_order(buyer, date, lines)
//!      │
//!      ├── validate: buyer set, lines non-empty, policy per line
//!      ├── totals = Σ lines, 10% tax (OutOfRange on overflow)
//!      ▼
//! BEGIN
//!      ├── buyer must exist and be a Buyer
//!      ├── number = ORD + yyyyMMdd (business day) + (count today + 1):03
//!      ├── INSERT sale_orders
//!      └── per line:
//!            re-read stock ── short? ──► InsufficientStock ──► ROLLBACK
//!            INSERT sales (order_id = header)
//!            stock -= qty
//!            INSERT sale_order_items
//! COMMIT
//! ```

use billing_core::order::{format_order_number, order_day_prefix, OrderTotals};
use billing_core::validation::{
    normalize_purchase, normalize_sale, validate_sale_order, ValidatedOrder,
};
use billing_core::{
    CoreError, LedgerEntry, NewPurchase, NewSale, NewSaleOrder, OrderStatus, Purchase,
    RecorderConfig, Sale, SaleOrder, StakeholderRole, ValidationError,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::BillingResult;
use crate::repository::order::OrderHeader;
use crate::repository::{
    InventoryLedger, PurchaseRepository, SaleOrderRepository, SaleRepository,
    StakeholderRepository,
};
use crate::unit_of_work::UnitOfWork;

/// Service that owns the transaction boundary for every stock-moving write.
#[derive(Debug, Clone)]
pub struct TransactionRecorder {
    pool: SqlitePool,
    config: RecorderConfig,
    inventory: InventoryLedger,
    purchases: PurchaseRepository,
    sales: SaleRepository,
    orders: SaleOrderRepository,
    stakeholders: StakeholderRepository,
}

impl TransactionRecorder {
    pub fn new(pool: SqlitePool, config: RecorderConfig) -> Self {
        TransactionRecorder {
            inventory: InventoryLedger::new(pool.clone()),
            purchases: PurchaseRepository::new(pool.clone()),
            sales: SaleRepository::new(pool.clone()),
            orders: SaleOrderRepository::new(pool.clone()),
            stakeholders: StakeholderRepository::new(pool.clone()),
            pool,
            config,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Records a purchase and raises the item's stock by its quantity.
    pub async fn record_purchase(&self, purchase: &NewPurchase) -> BillingResult<Purchase> {
        let entry = normalize_purchase(purchase, self.config.input_policy, Utc::now())?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = self.write_purchase(&mut uow, &entry).await;
        let purchase = uow.finish(result).await?;

        info!(
            purchase_id = purchase.purchase_id,
            item_id = purchase.item_id,
            quantity = purchase.quantity,
            "Purchase recorded"
        );
        Ok(purchase)
    }

    async fn write_purchase(
        &self,
        uow: &mut UnitOfWork,
        entry: &LedgerEntry,
    ) -> BillingResult<Purchase> {
        let item = self.inventory.get_item_in(uow, entry.item_id).await?;
        if item.stock_qty.checked_add(entry.quantity).is_none() {
            return Err(ValidationError::OutOfRange {
                field: "stock quantity".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let purchase = self.purchases.insert(uow, entry).await?;
        self.inventory
            .adjust_stock(uow, entry.item_id, entry.quantity)
            .await?;

        Ok(purchase)
    }

    /// Records a sale and lowers the item's stock by its quantity.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the quantity exceeds stock at the time of
    ///   the write. Nothing is written.
    pub async fn record_sale(&self, sale: &NewSale) -> BillingResult<Sale> {
        let entry = normalize_sale(sale, self.config.input_policy, Utc::now())?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = self.write_sale(&mut uow, &entry, None).await;
        let sale = uow.finish(result).await?;

        info!(
            sale_id = sale.sale_id,
            item_id = sale.item_id,
            quantity = sale.quantity,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Stock check, sale row, stock deduction. Shared by single sales and
    /// order lines.
    async fn write_sale(
        &self,
        uow: &mut UnitOfWork,
        entry: &LedgerEntry,
        order_id: Option<i64>,
    ) -> BillingResult<Sale> {
        let item = self.inventory.get_item_in(uow, entry.item_id).await?;

        if !item.can_sell(entry.quantity) {
            return Err(CoreError::InsufficientStock {
                item: item.name,
                available: item.stock_qty,
                requested: entry.quantity,
            }
            .into());
        }

        let sale = self.sales.insert(uow, entry, order_id).await?;
        self.inventory
            .adjust_stock(uow, entry.item_id, -entry.quantity)
            .await?;

        Ok(sale)
    }

    /// Creates a multi-line sale order.
    ///
    /// Every line also lands in the sales ledger (with `order_id` set) and
    /// lowers stock. Either the whole order is written or none of it is.
    ///
    /// ## Errors
    /// - `Validation` for a missing buyer, no lines, totals that overflow,
    ///   or a buyer id that belongs to a seller
    /// - `StakeholderNotFound` for an unknown buyer id
    /// - `InsufficientStock` for any short line
    pub async fn create_sale_order(&self, order: &NewSaleOrder) -> BillingResult<SaleOrder> {
        let order = validate_sale_order(order, self.config.input_policy, Utc::now())?;
        let totals = OrderTotals::compute(&order.lines, self.config.tax_rate)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = self.write_order(&mut uow, &order, totals).await;
        let created = uow.finish(result).await?;

        info!(
            order_id = created.order_id,
            order_number = %created.order_number,
            lines = created.items.len(),
            grand_total = %created.grand_total(),
            "Sale order created"
        );
        Ok(created)
    }

    async fn write_order(
        &self,
        uow: &mut UnitOfWork,
        order: &ValidatedOrder,
        totals: OrderTotals,
    ) -> BillingResult<SaleOrder> {
        let buyer = self.stakeholders.get_in(uow, order.buyer_id).await?;
        if buyer.role != StakeholderRole::Buyer {
            return Err(ValidationError::WrongRole {
                field: "buyer".to_string(),
                id: order.buyer_id,
                expected: "buyer".to_string(),
            }
            .into());
        }

        let day_prefix = order_day_prefix(
            &self.config.order_prefix,
            order.order_date,
            self.config.calendar,
        );
        let existing = self.orders.count_with_prefix(uow, &day_prefix).await?;
        let order_number = format_order_number(&day_prefix, existing + 1);

        let created_at = Utc::now();

        debug!(order_number = %order_number, subtotal = %totals.subtotal, "Writing sale order");

        let order_id = self
            .orders
            .insert_header(
                uow,
                &OrderHeader {
                    order_number: &order_number,
                    stakeholder_id: order.buyer_id,
                    order_date: order.order_date,
                    totals,
                    notes: order.notes.as_deref(),
                    created_at,
                },
            )
            .await?;

        let mut items = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let entry = LedgerEntry {
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                date: order.order_date,
                counterparty_id: Some(order.buyer_id),
            };

            // Stock first: a short line must fail before anything for it is written
            self.write_sale(uow, &entry, Some(order_id)).await?;
            items.push(self.orders.insert_line(uow, order_id, line).await?);
        }

        Ok(SaleOrder {
            order_id,
            order_number,
            stakeholder_id: order.buyer_id,
            order_date: order.order_date,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            grand_total_cents: totals.grand_total.cents(),
            status: OrderStatus::Completed,
            notes: order.notes.clone(),
            created_at,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use billing_core::types::TaxRate;
    use billing_core::{BusinessCalendar, OrderLine};
    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::test_support::{item, stakeholder, test_db, widget};
    use crate::Database;

    fn utc_config() -> RecorderConfig {
        RecorderConfig::default().with_calendar(BusinessCalendar::UTC)
    }

    fn recorder(db: &Database) -> TransactionRecorder {
        db.recorder(utc_config())
    }

    fn jan_15(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    async fn stock_of(db: &Database, item_id: i64) -> i64 {
        db.inventory().get_item(item_id).await.unwrap().stock_qty
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn sale(item_id: i64, quantity: i64, buyer_id: Option<i64>) -> NewSale {
        NewSale {
            item_id,
            quantity,
            unit_price_cents: 1000,
            date: None,
            buyer_id,
        }
    }

    // -------------------------------------------------------------------------
    // Purchases
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_purchase_raises_stock_and_writes_one_row() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let seller = stakeholder(&db, "Acme Supply", StakeholderRole::Seller, 0).await;

        let recorded = recorder(&db)
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: 7,
                unit_price_cents: 640,
                date: Some(jan_15(9)),
                seller_id: Some(seller.stakeholder_id),
            })
            .await
            .unwrap();

        assert_eq!(stock_of(&db, widget.item_id).await, 12);

        let rows = db.purchases().get_by_item(widget.item_id).await.unwrap();
        assert_eq!(rows, vec![recorded.clone()]);
        assert_eq!(recorded.quantity, 7);
        assert_eq!(recorded.unit_price_cents, 640);
        assert_eq!(recorded.purchase_date, jan_15(9));
        assert_eq!(recorded.seller_id, Some(seller.stakeholder_id));
    }

    #[tokio::test]
    async fn test_purchase_of_missing_item() {
        let db = test_db().await;

        let err = recorder(&db)
            .record_purchase(&NewPurchase {
                item_id: 404,
                quantity: 1,
                unit_price_cents: 100,
                date: None,
                seller_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(count(&db, "purchases").await, 0);
    }

    #[tokio::test]
    async fn test_purchase_coerces_bad_input() {
        let db = test_db().await;
        let widget = widget(&db).await;

        let recorded = recorder(&db)
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: 0,
                unit_price_cents: -300,
                date: None,
                seller_id: Some(-1),
            })
            .await
            .unwrap();

        assert_eq!(recorded.quantity, 1);
        assert_eq!(recorded.unit_price_cents, 0);
        assert_eq!(recorded.seller_id, None);
        assert_eq!(stock_of(&db, widget.item_id).await, 6);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_before_writing() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let strict = db.recorder(RecorderConfig::default().strict());

        let err = strict
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: -2,
                unit_price_cents: 100,
                date: None,
                seller_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = strict
            .record_sale(&NewSale {
                unit_price_cents: -1,
                ..sale(widget.item_id, 1, None)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(count(&db, "purchases").await, 0);
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
    }

    /// A fault between the row insert and the stock update leaves neither.
    #[tokio::test]
    async fn test_storage_fault_after_insert_rolls_back_everything() {
        let db = test_db().await;
        let widget = widget(&db).await;

        sqlx::query(
            r#"
            CREATE TRIGGER fail_stock_update
            BEFORE UPDATE OF stock_qty ON items
            BEGIN
                SELECT RAISE(ABORT, 'simulated storage fault');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = recorder(&db)
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: 3,
                unit_price_cents: 500,
                date: None,
                seller_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert!(err.to_string().contains("simulated storage fault"));
        assert_eq!(count(&db, "purchases").await, 0);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);

        let err = recorder(&db)
            .record_sale(&sale(widget.item_id, 2, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_widget_scenario() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let recorder = recorder(&db);

        recorder
            .record_sale(&sale(widget.item_id, 3, Some(buyer.stakeholder_id)))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, widget.item_id).await, 2);
        assert_eq!(db.sales().get_by_item(widget.item_id).await.unwrap().len(), 1);

        let err = recorder
            .record_sale(&sale(widget.item_id, 3, Some(buyer.stakeholder_id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(matches!(
            err,
            crate::BillingError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(stock_of(&db, widget.item_id).await, 2);
        assert_eq!(db.sales().get_by_item(widget.item_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sale_of_exact_stock_empties_item() {
        let db = test_db().await;
        let widget = widget(&db).await;

        recorder(&db)
            .record_sale(&sale(widget.item_id, 5, None))
            .await
            .unwrap();

        let item = db.inventory().get_item(widget.item_id).await.unwrap();
        assert_eq!(item.stock_qty, 0);
        assert_eq!(item.stock_status(), billing_core::StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_sale_reads_stock_changed_by_earlier_purchase() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let recorder = recorder(&db);

        recorder
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: 4,
                unit_price_cents: 600,
                date: None,
                seller_id: None,
            })
            .await
            .unwrap();

        recorder
            .record_sale(&sale(widget.item_id, 9, None))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, widget.item_id).await, 0);
    }

    // -------------------------------------------------------------------------
    // Sale orders
    // -------------------------------------------------------------------------

    fn order(buyer_id: i64, lines: Vec<OrderLine>) -> NewSaleOrder {
        NewSaleOrder {
            buyer_id: Some(buyer_id),
            order_date: Some(jan_15(10)),
            notes: Some("Counter sale".to_string()),
            lines,
        }
    }

    fn line(item_id: i64, quantity: i64, unit_price_cents: i64) -> OrderLine {
        OrderLine {
            item_id,
            quantity,
            unit_price_cents,
        }
    }

    #[tokio::test]
    async fn test_order_totals_and_ledger_rows() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let gadget = item(&db, "Gadget", 550, 10, 1).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;

        let created = recorder(&db)
            .create_sale_order(&order(
                buyer.stakeholder_id,
                vec![line(widget.item_id, 2, 1000), line(gadget.item_id, 3, 555)],
            ))
            .await
            .unwrap();

        let line_sum: i64 = created.items.iter().map(|i| i.line_total_cents).sum();
        assert_eq!(created.subtotal_cents, line_sum);
        assert_eq!(created.subtotal_cents, 3665);
        assert_eq!(created.tax_cents, 367); // 366.5 rounds half up
        assert_eq!(created.grand_total_cents, created.subtotal_cents + created.tax_cents);
        assert_eq!(created.status, OrderStatus::Completed);
        assert_eq!(created.notes.as_deref(), Some("Counter sale"));

        assert_eq!(stock_of(&db, widget.item_id).await, 3);
        assert_eq!(stock_of(&db, gadget.item_id).await, 7);

        let ledger = db.sales().get_by_order(created.order_id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|s| s.buyer_id == Some(buyer.stakeholder_id)));
        assert!(ledger.iter().all(|s| s.sale_date == jan_15(10)));

        let stored = db.orders().get(created.order_id).await.unwrap();
        assert_eq!(stored.order_number, created.order_number);
        assert_eq!(stored.items, created.items);
        assert_eq!(stored.grand_total_cents, created.grand_total_cents);
    }

    #[tokio::test]
    async fn test_order_numbers_sequence_per_day() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let recorder = recorder(&db);

        let first = recorder
            .create_sale_order(&order(buyer.stakeholder_id, vec![line(widget.item_id, 1, 1000)]))
            .await
            .unwrap();
        let second = recorder
            .create_sale_order(&order(buyer.stakeholder_id, vec![line(widget.item_id, 1, 1000)]))
            .await
            .unwrap();

        assert_eq!(first.order_number, "ORD20240115001");
        assert_eq!(second.order_number, "ORD20240115002");

        let next_day = recorder
            .create_sale_order(&NewSaleOrder {
                order_date: Some(Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap()),
                ..order(buyer.stakeholder_id, vec![line(widget.item_id, 1, 1000)])
            })
            .await
            .unwrap();
        assert_eq!(next_day.order_number, "ORD20240116001");
    }

    #[tokio::test]
    async fn test_order_with_short_line_writes_nothing() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let gadget = item(&db, "Gadget", 550, 1, 0).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;

        let err = recorder(&db)
            .create_sale_order(&order(
                buyer.stakeholder_id,
                vec![line(widget.item_id, 2, 1000), line(gadget.item_id, 2, 550)],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
        assert_eq!(stock_of(&db, gadget.item_id).await, 1);
        assert_eq!(count(&db, "sale_orders").await, 0);
        assert_eq!(count(&db, "sale_order_items").await, 0);
        assert_eq!(count(&db, "sales").await, 0);
    }

    #[tokio::test]
    async fn test_order_lines_for_same_item_share_stock() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;

        let err = recorder(&db)
            .create_sale_order(&order(
                buyer.stakeholder_id,
                vec![line(widget.item_id, 3, 1000), line(widget.item_id, 3, 1000)],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
    }

    #[tokio::test]
    async fn test_order_validation_happens_first() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let recorder = recorder(&db);

        let err = recorder
            .create_sale_order(&NewSaleOrder {
                buyer_id: None,
                ..order(1, vec![line(widget.item_id, 1, 1000)])
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = recorder
            .create_sale_order(&order(1, vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(count(&db, "sale_orders").await, 0);
    }

    #[tokio::test]
    async fn test_custom_prefix_and_rate() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let config = utc_config()
            .with_order_prefix("INV")
            .with_tax_rate(TaxRate::from_bps(500));

        let created = db
            .recorder(config)
            .create_sale_order(&order(buyer.stakeholder_id, vec![line(widget.item_id, 2, 1000)]))
            .await
            .unwrap();

        assert_eq!(created.order_number, "INV20240115001");
        assert_eq!(created.tax_cents, 100);
        assert_eq!(created.grand_total_cents, 2100);
    }

    #[tokio::test]
    async fn test_orders_by_stakeholder() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let b1 = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let b2 = stakeholder(&db, "B2", StakeholderRole::Buyer, 0).await;
        let recorder = recorder(&db);

        for (buyer, hour) in [(&b1, 9), (&b2, 10), (&b1, 11)] {
            recorder
                .create_sale_order(&NewSaleOrder {
                    order_date: Some(jan_15(hour)),
                    ..order(buyer.stakeholder_id, vec![line(widget.item_id, 1, 1000)])
                })
                .await
                .unwrap();
        }

        let orders = db.orders().get_by_stakeholder(b1.stakeholder_id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_date, jan_15(11));
        assert_eq!(orders[0].order_number, "ORD20240115003");
        assert!(orders.iter().all(|o| o.items.len() == 1));

        assert!(db.orders().get_by_stakeholder(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_day_uses_business_calendar() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let ist = db.recorder(utc_config().with_calendar(BusinessCalendar::fixed(330).unwrap()));

        let mut numbers = Vec::new();
        // 22:30 Jan 15, 01:30 Jan 16, 08:30 Jan 16 in India
        for (day, hour, minute) in [(15, 17, 0), (15, 20, 0), (16, 3, 0)] {
            let created = ist
                .create_sale_order(&NewSaleOrder {
                    order_date: Some(Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()),
                    ..order(buyer.stakeholder_id, vec![line(widget.item_id, 1, 1000)])
                })
                .await
                .unwrap();
            numbers.push(created.order_number);
        }

        assert_eq!(numbers, ["ORD20240115001", "ORD20240116001", "ORD20240116002"]);
    }

    #[tokio::test]
    async fn test_order_total_overflow_rejected_before_writing() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;

        let err = recorder(&db)
            .create_sale_order(&order(
                buyer.stakeholder_id,
                vec![line(widget.item_id, 1_000_000_000_000, 100_000_000)],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(count(&db, "sale_orders").await, 0);
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
    }

    #[tokio::test]
    async fn test_order_buyer_must_be_an_existing_buyer() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let seller = stakeholder(&db, "Acme Supply", StakeholderRole::Seller, 0).await;
        let recorder = recorder(&db);

        let err = recorder
            .create_sale_order(&order(seller.stakeholder_id, vec![line(widget.item_id, 1, 1000)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            crate::BillingError::Core(CoreError::Validation(ValidationError::WrongRole { .. }))
        ));

        let err = recorder
            .create_sale_order(&order(404, vec![line(widget.item_id, 1, 1000)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(count(&db, "sale_orders").await, 0);
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, widget.item_id).await, 5);
    }

    #[tokio::test]
    async fn test_purchase_that_would_overflow_stock() {
        let db = test_db().await;
        let full = item(&db, "Bulk", 0, i64::MAX - 1, 0).await;

        let err = recorder(&db)
            .record_purchase(&NewPurchase {
                item_id: full.item_id,
                quantity: 5,
                unit_price_cents: 0,
                date: None,
                seller_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(count(&db, "purchases").await, 0);
        assert_eq!(stock_of(&db, full.item_id).await, i64::MAX - 1);
    }
}
