//! # Sale Order Repository
//!
//! Sale order headers and their line items. Writes happen only inside the
//! Transaction Recorder's unit of work.

use billing_core::order::OrderTotals;
use billing_core::{CoreError, OrderLine, OrderStatus, SaleOrder, SaleOrderItem};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{BillingResult, DbResult};
use crate::unit_of_work::UnitOfWork;

/// Header fields of an order about to be written.
#[derive(Debug, Clone)]
pub struct OrderHeader<'a> {
    pub order_number: &'a str,
    pub stakeholder_id: i64,
    pub order_date: DateTime<Utc>,
    pub totals: OrderTotals,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Repository for sale order database operations.
#[derive(Debug, Clone)]
pub struct SaleOrderRepository {
    pool: SqlitePool,
}

impl SaleOrderRepository {
    /// Creates a new SaleOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleOrderRepository { pool }
    }

    /// Counts orders whose number starts with `day_prefix` (e.g. `ORD20240115`).
    ///
    /// Runs in the unit of work that will insert the next order, so the
    /// count and the insert see the same snapshot.
    pub async fn count_with_prefix(&self, uow: &mut UnitOfWork, day_prefix: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sale_orders
            WHERE substr(order_number, 1, length(?1)) = ?1
            "#,
        )
        .bind(day_prefix)
        .fetch_one(uow.conn())
        .await?;

        Ok(count)
    }

    /// Inserts an order header, returning its id.
    pub async fn insert_header(
        &self,
        uow: &mut UnitOfWork,
        header: &OrderHeader<'_>,
    ) -> DbResult<i64> {
        debug!(order_number = %header.order_number, "Inserting sale order");

        let result = sqlx::query(
            r#"
            INSERT INTO sale_orders (
                order_number, stakeholder_id, order_date,
                subtotal_cents, tax_cents, grand_total_cents,
                status, notes, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9
            )
            "#,
        )
        .bind(header.order_number)
        .bind(header.stakeholder_id)
        .bind(header.order_date)
        .bind(header.totals.subtotal.cents())
        .bind(header.totals.tax.cents())
        .bind(header.totals.grand_total.cents())
        .bind(OrderStatus::Completed)
        .bind(header.notes)
        .bind(header.created_at)
        .execute(uow.conn())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one order line.
    pub async fn insert_line(
        &self,
        uow: &mut UnitOfWork,
        order_id: i64,
        line: &OrderLine,
    ) -> DbResult<SaleOrderItem> {
        let line_total_cents = line.line_total().cents();

        let result = sqlx::query(
            r#"
            INSERT INTO sale_order_items (
                order_id, item_id, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(order_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line_total_cents)
        .execute(uow.conn())
        .await?;

        Ok(SaleOrderItem {
            order_item_id: result.last_insert_rowid(),
            order_id,
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            line_total_cents,
        })
    }

    /// Gets an order with its line items.
    pub async fn get(&self, order_id: i64) -> BillingResult<SaleOrder> {
        let order: Option<SaleOrder> = sqlx::query_as(
            r#"
            SELECT
                order_id, order_number, stakeholder_id, order_date,
                subtotal_cents, tax_cents, grand_total_cents,
                status, notes, created_at
            FROM sale_orders
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let mut order = order.ok_or(CoreError::SaleOrderNotFound(order_id))?;
        order.items = self.get_items(order_id).await?;
        Ok(order)
    }

    /// A stakeholder's orders, newest first, each with its line items.
    pub async fn get_by_stakeholder(&self, stakeholder_id: i64) -> BillingResult<Vec<SaleOrder>> {
        let mut orders: Vec<SaleOrder> = sqlx::query_as(
            r#"
            SELECT
                order_id, order_number, stakeholder_id, order_date,
                subtotal_cents, tax_cents, grand_total_cents,
                status, notes, created_at
            FROM sale_orders
            WHERE stakeholder_id = ?1
            ORDER BY order_date DESC, order_id DESC
            "#,
        )
        .bind(stakeholder_id)
        .fetch_all(&self.pool)
        .await?;

        for order in &mut orders {
            order.items = self.get_items(order.order_id).await?;
        }

        Ok(orders)
    }

    /// Line items of an order, in entry order.
    pub async fn get_items(&self, order_id: i64) -> BillingResult<Vec<SaleOrderItem>> {
        let items: Vec<SaleOrderItem> = sqlx::query_as(
            r#"
            SELECT order_item_id, order_id, item_id, quantity, unit_price_cents, line_total_cents
            FROM sale_order_items
            WHERE order_id = ?1
            ORDER BY order_item_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
