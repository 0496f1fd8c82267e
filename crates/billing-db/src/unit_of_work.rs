//! # Unit of Work
//!
//! One database transaction shared by every statement of a recording
//! operation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionRecorder::record_sale                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UnitOfWork::begin(pool) ──────────── BEGIN                             │
//! │       │                                                                 │
//! │       ├── InventoryLedger::get_item_in(&mut uow)     (fresh stock read) │
//! │       ├── SaleRepository::insert(&mut uow)                              │
//! │       └── InventoryLedger::adjust_stock(&mut uow)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  uow.finish(result) ── Ok  → COMMIT                                     │
//! │                     └─ Err → ROLLBACK, original error returned          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories never open their own transaction for these writes; they
//! take `&mut UnitOfWork` and run on [`UnitOfWork::conn`].
//!
//! While a unit is open it holds one pooled connection. With the
//! single-connection in-memory pool, nothing else may query through the
//! pool until the unit finishes.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, warn};

use crate::error::{BillingResult, DbError, DbResult, ErrorKind};

/// An open database transaction.
///
/// Dropping an unfinished unit rolls it back.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work opened");
        Ok(UnitOfWork { tx })
    }

    /// The connection every statement in this unit must run on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work committed");
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work rolled back");
        Ok(())
    }

    /// Commits on `Ok`, rolls back on `Err`.
    ///
    /// A failed rollback is logged; the caller still gets the error that
    /// caused it.
    pub async fn finish<T>(self, result: BillingResult<T>) -> BillingResult<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if err.kind() == ErrorKind::StorageFailure {
                    error!(error = %err, "Storage fault, rolling back unit of work");
                } else {
                    warn!(error = %err, "Rolling back unit of work");
                }
                if let Err(rollback_err) = self.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use billing_core::CoreError;

    async fn count_items(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn insert_widget(uow: &mut UnitOfWork) {
        sqlx::query("INSERT INTO items (name, sale_price_cents, stock_qty) VALUES ('Widget', 1000, 5)")
            .execute(uow.conn())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_finish_commits_on_ok() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
        insert_widget(&mut uow).await;
        uow.finish(Ok(())).await.unwrap();

        assert_eq!(count_items(&db).await, 1);
    }

    #[tokio::test]
    async fn test_finish_rolls_back_and_returns_original_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
        insert_widget(&mut uow).await;
        let result: BillingResult<()> = Err(CoreError::ItemNotFound(42).into());
        let err = uow.finish(result).await.unwrap_err();

        assert!(matches!(
            err,
            crate::BillingError::Core(CoreError::ItemNotFound(42))
        ));
        assert_eq!(count_items(&db).await, 0);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
            insert_widget(&mut uow).await;
        }

        assert_eq!(count_items(&db).await, 0);
    }
}
