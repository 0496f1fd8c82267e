//! # Purchase Repository
//!
//! Purchase rows are written only by the Transaction Recorder, inside the
//! unit of work that also raises stock. Nothing here updates or deletes one.

use billing_core::{DateRange, LedgerEntry, Money, Purchase, PurchaseRecord};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{BillingResult, DbResult};
use crate::unit_of_work::UnitOfWork;

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Inserts a purchase row in the caller's unit of work.
    pub async fn insert(&self, uow: &mut UnitOfWork, entry: &LedgerEntry) -> DbResult<Purchase> {
        debug!(item_id = entry.item_id, quantity = entry.quantity, "Inserting purchase");

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (item_id, quantity, unit_price_cents, purchase_date, seller_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(entry.item_id)
        .bind(entry.quantity)
        .bind(entry.unit_price_cents)
        .bind(entry.date)
        .bind(entry.counterparty_id)
        .execute(uow.conn())
        .await?;

        Ok(Purchase {
            purchase_id: result.last_insert_rowid(),
            item_id: entry.item_id,
            quantity: entry.quantity,
            unit_price_cents: entry.unit_price_cents,
            purchase_date: entry.date,
            seller_id: entry.counterparty_id,
        })
    }

    /// Purchase history, newest first, with item and seller names.
    pub async fn get_all(&self) -> BillingResult<Vec<PurchaseRecord>> {
        let records: Vec<PurchaseRecord> = sqlx::query_as(
            r#"
            SELECT
                p.purchase_id,
                p.item_id,
                i.name AS item_name,
                p.quantity,
                p.unit_price_cents,
                p.purchase_date,
                p.seller_id,
                s.name AS seller_name
            FROM purchases p
            JOIN items i ON i.item_id = p.item_id
            LEFT JOIN stakeholders s ON s.stakeholder_id = p.seller_id
            ORDER BY p.purchase_date DESC, p.purchase_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// All purchases of one item, oldest first.
    pub async fn get_by_item(&self, item_id: i64) -> BillingResult<Vec<Purchase>> {
        let purchases: Vec<Purchase> = sqlx::query_as(
            r#"
            SELECT purchase_id, item_id, quantity, unit_price_cents, purchase_date, seller_id
            FROM purchases
            WHERE item_id = ?1
            ORDER BY purchase_date, purchase_id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Σ quantity × unit price over purchases dated in `[start, end)`.
    pub async fn total_amount(&self, range: DateRange) -> BillingResult<Money> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price_cents), 0)
            FROM purchases
            WHERE purchase_date >= ?1 AND purchase_date < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total))
    }
}
