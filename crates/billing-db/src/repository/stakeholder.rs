//! # Stakeholder Repository
//!
//! Buyers and sellers. Purchases, sales and orders point at stakeholders
//! by id without a foreign key, so deletes check references by hand.

use billing_core::validation::validate_new_stakeholder;
use billing_core::{CoreError, Money, NewStakeholder, Stakeholder, StakeholderRole};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::BillingResult;
use crate::unit_of_work::UnitOfWork;

/// Repository for stakeholder database operations.
#[derive(Debug, Clone)]
pub struct StakeholderRepository {
    pool: SqlitePool,
}

impl StakeholderRepository {
    /// Creates a new StakeholderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StakeholderRepository { pool }
    }

    pub async fn get_all(&self) -> BillingResult<Vec<Stakeholder>> {
        let stakeholders: Vec<Stakeholder> = sqlx::query_as(
            r#"
            SELECT stakeholder_id, name, contact_number, address, role, discount_bps
            FROM stakeholders
            ORDER BY name COLLATE NOCASE, stakeholder_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stakeholders)
    }

    /// Lists buyers or sellers, by name.
    pub async fn get_by_type(&self, role: StakeholderRole) -> BillingResult<Vec<Stakeholder>> {
        let stakeholders: Vec<Stakeholder> = sqlx::query_as(
            r#"
            SELECT stakeholder_id, name, contact_number, address, role, discount_bps
            FROM stakeholders
            WHERE role = ?1
            ORDER BY name COLLATE NOCASE, stakeholder_id
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(stakeholders)
    }

    pub async fn get(&self, stakeholder_id: i64) -> BillingResult<Stakeholder> {
        let stakeholder: Option<Stakeholder> = sqlx::query_as(
            r#"
            SELECT stakeholder_id, name, contact_number, address, role, discount_bps
            FROM stakeholders
            WHERE stakeholder_id = ?1
            "#,
        )
        .bind(stakeholder_id)
        .fetch_optional(&self.pool)
        .await?;

        stakeholder.ok_or_else(|| CoreError::StakeholderNotFound(stakeholder_id).into())
    }

    /// Same as [`get`](Self::get), on the unit's connection.
    pub async fn get_in(
        &self,
        uow: &mut UnitOfWork,
        stakeholder_id: i64,
    ) -> BillingResult<Stakeholder> {
        let stakeholder: Option<Stakeholder> = sqlx::query_as(
            r#"
            SELECT stakeholder_id, name, contact_number, address, role, discount_bps
            FROM stakeholders
            WHERE stakeholder_id = ?1
            "#,
        )
        .bind(stakeholder_id)
        .fetch_optional(uow.conn())
        .await?;

        stakeholder.ok_or_else(|| CoreError::StakeholderNotFound(stakeholder_id).into())
    }

    /// Inserts a stakeholder. Sellers are stored with a zero discount.
    pub async fn add(&self, stakeholder: &NewStakeholder) -> BillingResult<Stakeholder> {
        let s = validate_new_stakeholder(stakeholder)?;

        debug!(name = %s.name, role = ?s.role, "Inserting stakeholder");

        let result = sqlx::query(
            r#"
            INSERT INTO stakeholders (name, contact_number, address, role, discount_bps)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&s.name)
        .bind(&s.contact_number)
        .bind(&s.address)
        .bind(s.role)
        .bind(s.discount_bps)
        .execute(&self.pool)
        .await?;

        let created = Stakeholder {
            stakeholder_id: result.last_insert_rowid(),
            name: s.name,
            contact_number: s.contact_number,
            address: s.address,
            role: s.role,
            discount_bps: s.discount_bps,
        };

        info!(stakeholder_id = created.stakeholder_id, "Stakeholder added");
        Ok(created)
    }

    /// Replaces every field of an existing stakeholder.
    pub async fn update(&self, stakeholder: &Stakeholder) -> BillingResult<Stakeholder> {
        let s = validate_new_stakeholder(&NewStakeholder {
            name: stakeholder.name.clone(),
            contact_number: stakeholder.contact_number.clone(),
            address: stakeholder.address.clone(),
            role: stakeholder.role,
            discount_bps: stakeholder.discount_bps,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE stakeholders SET
                name = ?2,
                contact_number = ?3,
                address = ?4,
                role = ?5,
                discount_bps = ?6
            WHERE stakeholder_id = ?1
            "#,
        )
        .bind(stakeholder.stakeholder_id)
        .bind(&s.name)
        .bind(&s.contact_number)
        .bind(&s.address)
        .bind(s.role)
        .bind(s.discount_bps)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::StakeholderNotFound(stakeholder.stakeholder_id).into());
        }

        Ok(Stakeholder {
            stakeholder_id: stakeholder.stakeholder_id,
            name: s.name,
            contact_number: s.contact_number,
            address: s.address,
            role: s.role,
            discount_bps: s.discount_bps,
        })
    }

    /// Deletes a stakeholder no purchase, sale or order points at.
    pub async fn delete(&self, stakeholder_id: i64) -> BillingResult<()> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = delete_unreferenced(&mut uow, stakeholder_id).await;
        uow.finish(result).await?;

        info!(stakeholder_id, "Stakeholder deleted");
        Ok(())
    }

    /// `price` reduced by the stakeholder's discount percentage.
    ///
    /// Sellers carry no discount, so their price comes back unchanged.
    pub async fn discounted_price(&self, price: Money, stakeholder_id: i64) -> BillingResult<Money> {
        let stakeholder = self.get(stakeholder_id).await?;
        Ok(stakeholder.discounted(price))
    }
}

async fn delete_unreferenced(uow: &mut UnitOfWork, stakeholder_id: i64) -> BillingResult<()> {
    let references: i64 = sqlx::query_scalar(
        r#"
        SELECT
            (SELECT COUNT(*) FROM purchases WHERE seller_id = ?1)
          + (SELECT COUNT(*) FROM sales WHERE buyer_id = ?1)
          + (SELECT COUNT(*) FROM sale_orders WHERE stakeholder_id = ?1)
        "#,
    )
    .bind(stakeholder_id)
    .fetch_one(uow.conn())
    .await?;

    if references > 0 {
        warn!(stakeholder_id, references, "Stakeholder delete blocked");
        return Err(CoreError::conflict(
            "stakeholder",
            stakeholder_id,
            "it has associated purchases, sales or orders",
        )
        .into());
    }

    let result = sqlx::query("DELETE FROM stakeholders WHERE stakeholder_id = ?1")
        .bind(stakeholder_id)
        .execute(uow.conn())
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::StakeholderNotFound(stakeholder_id).into());
    }

    Ok(())
}
