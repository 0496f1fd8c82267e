//! # Sale Order Arithmetic
//!
//! Totals and order-number formatting for multi-line sale orders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► Σ qty × unit price ──► subtotal                              │
//! │                                      │                                  │
//! │                                      ├──► tax = subtotal × rate         │
//! │                                      ▼                                  │
//! │                            grand total = subtotal + tax                 │
//! │                                                                         │
//! │  number = prefix + yyyyMMdd + (orders already numbered today + 1):03    │
//! │           ORD20240115001, ORD20240115002, ...                           │
//! │           (yyyyMMdd is the day on the configured BusinessCalendar)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BusinessCalendar, OrderLine, TaxRate};
use crate::validation::ValidationResult;

/// Computed money figures of a sale order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl OrderTotals {
    /// Totals for `lines` at `rate`. Tax rounds half up to the cent.
    ///
    /// Fails with `OutOfRange` when a line total, the subtotal or the grand
    /// total does not fit in i64 cents.
    ///
    /// ```rust
    /// use billing_core::order::OrderTotals;
    /// use billing_core::types::{OrderLine, TaxRate};
    ///
    /// let lines = [OrderLine { item_id: 1, quantity: 3, unit_price_cents: 1000 }];
    /// let totals = OrderTotals::compute(&lines, TaxRate::from_bps(1000)).unwrap();
    /// assert_eq!(totals.grand_total.cents(), 3300);
    /// ```
    pub fn compute(lines: &[OrderLine], rate: TaxRate) -> ValidationResult<Self> {
        let mut subtotal = Money::zero();
        for line in lines {
            subtotal = line
                .checked_line_total()
                .and_then(|total| subtotal.checked_add(total))
                .ok_or_else(|| too_large("order subtotal"))?;
        }

        let tax = subtotal.calculate_tax(rate);
        let grand_total = subtotal
            .checked_add(tax)
            .ok_or_else(|| too_large("order grand total"))?;

        Ok(OrderTotals {
            subtotal,
            tax,
            grand_total,
        })
    }
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

/// Prefix shared by every order placed on `date`'s business day:
/// `ORD` + `yyyyMMdd`.
pub fn order_day_prefix(prefix: &str, date: DateTime<Utc>, calendar: BusinessCalendar) -> String {
    format!("{}{}", prefix, calendar.date_of(date).format("%Y%m%d"))
}

/// Appends the zero-padded daily sequence. Widens past 999.
pub fn format_order_number(day_prefix: &str, sequence: i64) -> String {
    format!("{}{:03}", day_prefix, sequence)
}
