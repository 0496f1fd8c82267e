//! # Reporting
//!
//! Read-only aggregates for the dashboard.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dashboard(now, config)                                                 │
//! │                                                                         │
//! │   month = [1st of now's month, 1st of next month) on config.calendar    │
//! │                                                                         │
//! │   purchases ── Σ qty × price in month ──┐                               │
//! │   sales     ── Σ qty × price in month ──┼──► balance = sales − purch.   │
//! │   items     ── Σ stock_qty              │                               │
//! │   purchases ∪ sales ── newest N ────────┘──► recent activity            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billing_core::{DashboardSummary, DateRange, RecentTransaction, RecorderConfig};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::BillingResult;
use crate::repository::{InventoryLedger, PurchaseRepository, SaleRepository};

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Month-to-date figures for the month containing `now` on the
    /// configured calendar, with `config.recent_limit` recent rows.
    pub async fn dashboard(
        &self,
        now: DateTime<Utc>,
        config: &RecorderConfig,
    ) -> BillingResult<DashboardSummary> {
        let period = DateRange::month_of(now, config.calendar);
        debug!(start = %period.start, end = %period.end, "Building dashboard");

        let purchases = PurchaseRepository::new(self.pool.clone())
            .total_amount(period)
            .await?;
        let sales = SaleRepository::new(self.pool.clone())
            .total_amount(period)
            .await?;
        let total_stock = InventoryLedger::new(self.pool.clone()).total_stock().await?;
        let recent = self.recent_transactions(config.recent_limit).await?;

        Ok(DashboardSummary {
            period,
            purchases_cents: purchases.cents(),
            sales_cents: sales.cents(),
            total_stock,
            balance_cents: (sales - purchases).cents(),
            recent,
        })
    }

    /// The newest `limit` purchases and sales, merged, newest first.
    pub async fn recent_transactions(&self, limit: u32) -> BillingResult<Vec<RecentTransaction>> {
        let rows: Vec<RecentTransaction> = sqlx::query_as(
            r#"
            SELECT kind, date, item_name, quantity, amount_cents, counterparty
            FROM (
                SELECT
                    'purchase' AS kind,
                    p.purchase_date AS date,
                    i.name AS item_name,
                    p.quantity AS quantity,
                    p.quantity * p.unit_price_cents AS amount_cents,
                    s.name AS counterparty,
                    p.purchase_id AS row_id
                FROM purchases p
                JOIN items i ON i.item_id = p.item_id
                LEFT JOIN stakeholders s ON s.stakeholder_id = p.seller_id

                UNION ALL

                SELECT
                    'sale' AS kind,
                    sa.sale_date AS date,
                    i.name AS item_name,
                    sa.quantity AS quantity,
                    sa.quantity * sa.unit_price_cents AS amount_cents,
                    b.name AS counterparty,
                    sa.sale_id AS row_id
                FROM sales sa
                JOIN items i ON i.item_id = sa.item_id
                LEFT JOIN stakeholders b ON b.stakeholder_id = sa.buyer_id
            )
            ORDER BY date DESC, row_id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use billing_core::{
        BusinessCalendar, NewPurchase, NewSale, NewSaleOrder, OrderLine, StakeholderRole,
        TransactionKind,
    };
    use chrono::TimeZone;

    use super::*;
    use crate::repository::test_support::{item, stakeholder, test_db, widget};

    fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
    }

    fn utc() -> RecorderConfig {
        RecorderConfig::default().with_calendar(BusinessCalendar::UTC)
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = test_db().await;
        let summary = db.reports().dashboard(at(5, 1, 0), &utc()).await.unwrap();

        assert_eq!(summary.purchases_cents, 0);
        assert_eq!(summary.sales_cents, 0);
        assert_eq!(summary.balance_cents, 0);
        assert_eq!(summary.total_stock, 0);
        assert!(summary.recent.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_month_totals_and_recent() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let bolt = item(&db, "Bolt", 50, 100, 10).await;
        let seller = stakeholder(&db, "Acme Supply", StakeholderRole::Seller, 0).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let recorder = db.recorder(utc());

        // Previous month: excluded from totals, still in recent activity
        recorder
            .record_purchase(&NewPurchase {
                item_id: bolt.item_id,
                quantity: 10,
                unit_price_cents: 30,
                date: Some(at(2, 28, 12)),
                seller_id: Some(seller.stakeholder_id),
            })
            .await
            .unwrap();

        recorder
            .record_purchase(&NewPurchase {
                item_id: widget.item_id,
                quantity: 5,
                unit_price_cents: 600,
                date: Some(at(3, 2, 9)),
                seller_id: Some(seller.stakeholder_id),
            })
            .await
            .unwrap();
        recorder
            .record_sale(&NewSale {
                item_id: widget.item_id,
                quantity: 4,
                unit_price_cents: 1000,
                date: Some(at(3, 3, 9)),
                buyer_id: Some(buyer.stakeholder_id),
            })
            .await
            .unwrap();
        recorder
            .create_sale_order(&NewSaleOrder {
                buyer_id: Some(buyer.stakeholder_id),
                order_date: Some(at(3, 4, 9)),
                notes: None,
                lines: vec![OrderLine {
                    item_id: bolt.item_id,
                    quantity: 20,
                    unit_price_cents: 50,
                }],
            })
            .await
            .unwrap();

        let summary = db
            .reports()
            .dashboard(at(3, 15, 18), &utc().with_recent_limit(3))
            .await
            .unwrap();

        assert_eq!(summary.period.start, at(3, 1, 0));
        assert_eq!(summary.purchases_cents, 3000);
        // single sale + order line, untaxed ledger amounts
        assert_eq!(summary.sales_cents, 4000 + 1000);
        assert_eq!(summary.balance_cents, 2000);
        // widget 5 + 5 - 4, bolt 100 + 10 - 20
        assert_eq!(summary.total_stock, 6 + 90);

        assert_eq!(summary.recent.len(), 3);
        assert_eq!(summary.recent[0].kind, TransactionKind::Sale);
        assert_eq!(summary.recent[0].item_name, "Bolt");
        assert_eq!(summary.recent[0].amount_cents, 1000);
        assert_eq!(summary.recent[1].kind, TransactionKind::Sale);
        assert_eq!(summary.recent[1].counterparty.as_deref(), Some("B1"));
        assert_eq!(summary.recent[2].kind, TransactionKind::Purchase);
        assert_eq!(summary.recent[2].date, at(3, 2, 9));

        let all = db.reports().recent_transactions(10).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].date, at(2, 28, 12));
    }

    #[tokio::test]
    async fn test_dashboard_month_follows_calendar() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let ist = utc().with_calendar(BusinessCalendar::fixed(330).unwrap());

        // 02:00 on Apr 1 in India, still Mar 31 in UTC
        db.recorder(ist.clone())
            .record_sale(&NewSale {
                item_id: widget.item_id,
                quantity: 1,
                unit_price_cents: 700,
                date: Some(Utc.with_ymd_and_hms(2024, 3, 31, 20, 30, 0).unwrap()),
                buyer_id: None,
            })
            .await
            .unwrap();

        let april_ist = db.reports().dashboard(at(4, 10, 12), &ist).await.unwrap();
        assert_eq!(april_ist.sales_cents, 700);
        assert_eq!(april_ist.period.start, Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 0).unwrap());

        let march_utc = db.reports().dashboard(at(3, 10, 12), &utc()).await.unwrap();
        assert_eq!(march_utc.sales_cents, 700);
        let april_utc = db.reports().dashboard(at(4, 10, 12), &utc()).await.unwrap();
        assert_eq!(april_utc.sales_cents, 0);
    }
}
