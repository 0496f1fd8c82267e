//! # Inventory Ledger
//!
//! Items and their running stock totals.
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_qty only moves through adjust_stock, inside a unit of work:     │
//! │                                                                         │
//! │    purchase  ──► adjust_stock(+qty)                                     │
//! │    sale      ──► adjust_stock(−qty)   (sufficiency checked by caller)   │
//! │    order     ──► adjust_stock(−qty) per line                            │
//! │                                                                         │
//! │  update_item may also overwrite stock_qty (manual correction).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billing_core::validation::{validate_item_name, validate_new_item, validate_price_cents};
use billing_core::{CoreError, Item, NewItem, ValidationError};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{BillingError, BillingResult, DbError};
use crate::unit_of_work::UnitOfWork;

/// Repository for items and stock.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Gets an item by ID, reading current stock and pricing.
    pub async fn get_item(&self, item_id: i64) -> BillingResult<Item> {
        let item: Option<Item> = sqlx::query_as(
            r#"
            SELECT item_id, name, sale_price_cents, stock_qty, min_stock_level
            FROM items
            WHERE item_id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        item.ok_or_else(|| CoreError::ItemNotFound(item_id).into())
    }

    /// Gets an item inside a unit of work.
    ///
    /// The read sees this unit's own earlier writes, so a second order line
    /// for the same item checks against the already-reduced stock.
    pub async fn get_item_in(&self, uow: &mut UnitOfWork, item_id: i64) -> BillingResult<Item> {
        let item: Option<Item> = sqlx::query_as(
            r#"
            SELECT item_id, name, sale_price_cents, stock_qty, min_stock_level
            FROM items
            WHERE item_id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_optional(uow.conn())
        .await?;

        item.ok_or_else(|| CoreError::ItemNotFound(item_id).into())
    }

    /// Lists all items by name.
    pub async fn get_all_items(&self) -> BillingResult<Vec<Item>> {
        let items: Vec<Item> = sqlx::query_as(
            r#"
            SELECT item_id, name, sale_price_cents, stock_qty, min_stock_level
            FROM items
            ORDER BY name COLLATE NOCASE, item_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items at or below their minimum stock level, emptiest first.
    pub async fn low_stock_items(&self) -> BillingResult<Vec<Item>> {
        let items: Vec<Item> = sqlx::query_as(
            r#"
            SELECT item_id, name, sale_price_cents, stock_qty, min_stock_level
            FROM items
            WHERE stock_qty <= min_stock_level
            ORDER BY stock_qty, name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sum of stock across all items.
    pub async fn total_stock(&self) -> BillingResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(stock_qty), 0) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    /// Inserts a new item.
    ///
    /// ## Errors
    /// - `ValidationError` for a blank/long name or negative numbers
    /// - `ValidationError::Duplicate` when the name is taken
    pub async fn add_item(&self, item: &NewItem) -> BillingResult<Item> {
        let item = validate_new_item(item)?;

        debug!(name = %item.name, "Inserting item");

        let result = sqlx::query(
            r#"
            INSERT INTO items (name, sale_price_cents, stock_qty, min_stock_level)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&item.name)
        .bind(item.sale_price_cents)
        .bind(item.stock_qty)
        .bind(item.min_stock_level)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, &item.name))?;

        let created = Item {
            item_id: result.last_insert_rowid(),
            name: item.name,
            sale_price_cents: item.sale_price_cents,
            stock_qty: item.stock_qty,
            min_stock_level: item.min_stock_level,
        };

        info!(item_id = created.item_id, name = %created.name, "Item added");
        Ok(created)
    }

    /// Updates name, price, stock and minimum level of an existing item.
    pub async fn update_item(&self, item: &Item) -> BillingResult<Item> {
        let name = validate_item_name(&item.name)?;
        validate_price_cents(item.sale_price_cents)?;
        if item.min_stock_level < 0 {
            return Err(ValidationError::OutOfRange {
                field: "minimum stock level".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        debug!(item_id = item.item_id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                sale_price_cents = ?3,
                stock_qty = ?4,
                min_stock_level = ?5
            WHERE item_id = ?1
            "#,
        )
        .bind(item.item_id)
        .bind(&name)
        .bind(item.sale_price_cents)
        .bind(item.stock_qty)
        .bind(item.min_stock_level)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, &name))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(item.item_id).into());
        }

        Ok(Item {
            name,
            ..item.clone()
        })
    }

    /// Applies `stock += delta` inside the caller's unit of work.
    ///
    /// Does not check sufficiency: the caller does that in the same unit,
    /// before calling this.
    pub async fn adjust_stock(
        &self,
        uow: &mut UnitOfWork,
        item_id: i64,
        delta: i64,
    ) -> BillingResult<()> {
        debug!(item_id, delta, "Adjusting stock");

        let result = sqlx::query("UPDATE items SET stock_qty = stock_qty + ?2 WHERE item_id = ?1")
            .bind(item_id)
            .bind(delta)
            .execute(uow.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(item_id).into());
        }

        Ok(())
    }

    /// Deletes an item that no purchase, sale or order line references.
    pub async fn delete_item(&self, item_id: i64) -> BillingResult<()> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = delete_unreferenced(&mut uow, item_id).await;
        uow.finish(result).await?;

        info!(item_id, "Item deleted");
        Ok(())
    }
}

async fn delete_unreferenced(uow: &mut UnitOfWork, item_id: i64) -> BillingResult<()> {
    let references: i64 = sqlx::query_scalar(
        r#"
        SELECT
            (SELECT COUNT(*) FROM purchases WHERE item_id = ?1)
          + (SELECT COUNT(*) FROM sales WHERE item_id = ?1)
          + (SELECT COUNT(*) FROM sale_order_items WHERE item_id = ?1)
        "#,
    )
    .bind(item_id)
    .fetch_one(uow.conn())
    .await?;

    if references > 0 {
        warn!(item_id, references, "Item delete blocked");
        return Err(CoreError::conflict(
            "item",
            item_id,
            "it has associated sales or purchases",
        )
        .into());
    }

    let result = sqlx::query("DELETE FROM items WHERE item_id = ?1")
        .bind(item_id)
        .execute(uow.conn())
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ItemNotFound(item_id).into());
    }

    Ok(())
}

/// Maps a UNIQUE violation on `items.name` to a validation error naming
/// the value the caller sent.
fn duplicate_name(err: sqlx::Error, name: &str) -> BillingError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => ValidationError::Duplicate {
            field: "item name".to_string(),
            value: name.to_string(),
        }
        .into(),
        other => other.into(),
    }
}
