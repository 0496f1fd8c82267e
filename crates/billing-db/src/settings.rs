//! # Settings
//!
//! Builds the database and recorder configuration from environment
//! variables. The result is a plain value handed to `Database::new` and
//! `Database::recorder`; nothing is stored globally.
//!
//! ## Environment Variables
//! - `BILLING_DB_PATH`: database file (default `./om_billing.db`)
//! - `BILLING_TAX_RATE`: order tax in percent, e.g. `"10"` or `"7.5"`
//! - `BILLING_ORDER_PREFIX`: order-number prefix (default `ORD`)
//! - `BILLING_STRICT_INPUT`: `1`/`true` rejects bad quantities and prices
//!   instead of coercing them
//! - `BILLING_UTC_OFFSET`: calendar for order-number days and dashboard
//!   months; `local` (default), `utc`, or an offset like `+05:30`

use billing_core::types::TaxRate;
use billing_core::{BusinessCalendar, InputPolicy, RecorderConfig};
use tracing::warn;

use crate::pool::DbConfig;

pub const DEFAULT_DB_PATH: &str = "./om_billing.db";

/// Everything needed to open the database and record transactions.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub db: DbConfig,
    pub recorder: RecorderConfig,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            db: DbConfig::new(DEFAULT_DB_PATH),
            recorder: RecorderConfig::default(),
        }
    }
}

impl BillingConfig {
    /// Reads the process environment. Unparseable values are logged and
    /// the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = BillingConfig::default();

        if let Some(path) = lookup("BILLING_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db = DbConfig::new(path.trim());
        }

        if let Some(rate) = lookup("BILLING_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if (0.0..=100.0).contains(&pct) => {
                    config.recorder.tax_rate = TaxRate::from_percentage(pct);
                }
                _ => warn!(value = %rate, "Ignoring invalid BILLING_TAX_RATE"),
            }
        }

        if let Some(prefix) = lookup("BILLING_ORDER_PREFIX") {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                warn!("Ignoring empty BILLING_ORDER_PREFIX");
            } else {
                config.recorder.order_prefix = prefix.to_string();
            }
        }

        if let Some(strict) = lookup("BILLING_STRICT_INPUT") {
            match strict.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.recorder.input_policy = InputPolicy::Strict,
                "0" | "false" | "no" | "" => config.recorder.input_policy = InputPolicy::Coerce,
                _ => warn!(value = %strict, "Ignoring invalid BILLING_STRICT_INPUT"),
            }
        }

        if let Some(offset) = lookup("BILLING_UTC_OFFSET") {
            match parse_calendar(&offset) {
                Some(calendar) => config.recorder.calendar = calendar,
                None => warn!(value = %offset, "Ignoring invalid BILLING_UTC_OFFSET"),
            }
        }

        config
    }
}

/// `local`, `utc`/`z`, or `±HH`, `±HHMM`, `±HH:MM`.
fn parse_calendar(text: &str) -> Option<BusinessCalendar> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "local" | "" => return Some(BusinessCalendar::Local),
        "utc" | "z" => return Some(BusinessCalendar::UTC),
        _ => {}
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }

    BusinessCalendar::fixed(sign * (hours * 60 + minutes))
}
