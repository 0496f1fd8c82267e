//! Recorder configuration.
//!
//! Pure data. Reading it from the environment lives in billing-db's
//! `settings` module.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{BusinessCalendar, TaxRate};
use crate::{DEFAULT_ORDER_PREFIX, DEFAULT_RECENT_LIMIT};

/// How out-of-range quantities and prices on purchases, sales and order
/// lines are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Silently repair: quantity ≤ 0 becomes 1, negative price becomes 0,
    /// counterparty ≤ 0 becomes "none".
    #[default]
    Coerce,
    /// Reject with a `ValidationError` instead of repairing.
    Strict,
}

/// Settings consumed by the transaction recorder and dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecorderConfig {
    /// Tax applied to every sale order.
    pub tax_rate: TaxRate,

    /// Literal prefix of generated order numbers.
    pub order_prefix: String,

    /// Rows in the dashboard's recent-activity list.
    pub recent_limit: u32,

    pub input_policy: InputPolicy,

    /// Calendar for order-number days and dashboard months.
    pub calendar: BusinessCalendar,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            tax_rate: TaxRate::default(),
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            input_policy: InputPolicy::default(),
            calendar: BusinessCalendar::default(),
        }
    }
}

impl RecorderConfig {
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_order_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_prefix = prefix.into();
        self
    }

    pub fn with_recent_limit(mut self, limit: u32) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_calendar(mut self, calendar: BusinessCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn strict(mut self) -> Self {
        self.input_policy = InputPolicy::Strict;
        self
    }
}
