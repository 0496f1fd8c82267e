//! # Sale Repository
//!
//! Single-line sale rows.
//!
//! ## Where Sale Rows Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(item, qty)           ──► 1 row, order_id = NULL            │
//! │                                                                         │
//! │  create_sale_order(lines[3])      ──► 1 sale_orders header              │
//! │                                       3 sale_order_items                │
//! │                                       3 rows here, order_id = header id │
//! │                                                                         │
//! │  Sales totals and history read this table only, so order lines are     │
//! │  counted exactly once.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billing_core::{DateRange, LedgerEntry, Money, Sale, SaleRecord};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{BillingResult, DbResult};
use crate::unit_of_work::UnitOfWork;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale row in the caller's unit of work.
    ///
    /// `order_id` is set when the row materializes a sale order line.
    pub async fn insert(
        &self,
        uow: &mut UnitOfWork,
        entry: &LedgerEntry,
        order_id: Option<i64>,
    ) -> DbResult<Sale> {
        debug!(
            item_id = entry.item_id,
            quantity = entry.quantity,
            order_id = ?order_id,
            "Inserting sale"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO sales (item_id, quantity, unit_price_cents, sale_date, buyer_id, order_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(entry.item_id)
        .bind(entry.quantity)
        .bind(entry.unit_price_cents)
        .bind(entry.date)
        .bind(entry.counterparty_id)
        .bind(order_id)
        .execute(uow.conn())
        .await?;

        Ok(Sale {
            sale_id: result.last_insert_rowid(),
            item_id: entry.item_id,
            quantity: entry.quantity,
            unit_price_cents: entry.unit_price_cents,
            sale_date: entry.date,
            buyer_id: entry.counterparty_id,
            order_id,
        })
    }

    /// Sale history, newest first, with item and buyer names.
    pub async fn get_all(&self) -> BillingResult<Vec<SaleRecord>> {
        let records: Vec<SaleRecord> = sqlx::query_as(
            r#"
            SELECT
                s.sale_id,
                s.item_id,
                i.name AS item_name,
                s.quantity,
                s.unit_price_cents,
                s.sale_date,
                s.buyer_id,
                b.name AS buyer_name,
                s.order_id
            FROM sales s
            JOIN items i ON i.item_id = s.item_id
            LEFT JOIN stakeholders b ON b.stakeholder_id = s.buyer_id
            ORDER BY s.sale_date DESC, s.sale_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// All sales of one item, oldest first.
    pub async fn get_by_item(&self, item_id: i64) -> BillingResult<Vec<Sale>> {
        let sales: Vec<Sale> = sqlx::query_as(
            r#"
            SELECT sale_id, item_id, quantity, unit_price_cents, sale_date, buyer_id, order_id
            FROM sales
            WHERE item_id = ?1
            ORDER BY sale_date, sale_id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Ledger rows materialized by one sale order.
    pub async fn get_by_order(&self, order_id: i64) -> BillingResult<Vec<Sale>> {
        let sales: Vec<Sale> = sqlx::query_as(
            r#"
            SELECT sale_id, item_id, quantity, unit_price_cents, sale_date, buyer_id, order_id
            FROM sales
            WHERE order_id = ?1
            ORDER BY sale_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Σ quantity × unit price over sales dated in `[start, end)`.
    pub async fn total_amount(&self, range: DateRange) -> BillingResult<Money> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price_cents), 0)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total))
    }
}

#[cfg(test)]
mod tests {
    use billing_core::{BusinessCalendar, NewSale, RecorderConfig, StakeholderRole};
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::repository::test_support::{stakeholder, test_db, widget};

    #[tokio::test]
    async fn test_history_and_range_total() {
        let db = test_db().await;
        let widget = widget(&db).await;
        let buyer = stakeholder(&db, "B1", StakeholderRole::Buyer, 0).await;
        let recorder = db.recorder(RecorderConfig::default());

        let in_range = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let out_of_range = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        for (date, qty) in [(in_range, 2), (out_of_range, 1)] {
            recorder
                .record_sale(&NewSale {
                    item_id: widget.item_id,
                    quantity: qty,
                    unit_price_cents: 1000,
                    date: Some(date),
                    buyer_id: Some(buyer.stakeholder_id),
                })
                .await
                .unwrap();
        }

        let history = db.sales().get_all().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sale_date, out_of_range);
        assert_eq!(history[1].buyer_name.as_deref(), Some("B1"));
        assert_eq!(history[1].order_id, None);

        let march = DateRange::month_of(in_range, BusinessCalendar::UTC);
        assert_eq!(db.sales().total_amount(march).await.unwrap().cents(), 2000);
    }
}
