//! # Validation Module
//!
//! Input validation and normalization for OM Billing.
//!
//! ## Where It Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller payload (NewPurchase / NewSale / NewSaleOrder / NewItem ...)    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE                                                            │
//! │  ├── names: trimmed, non-empty, ≤ 200 chars                             │
//! │  ├── quantity / price: coerced or rejected per InputPolicy              │
//! │  └── UI text → Money / quantity                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  unit of work opens (nothing above touches the database)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billing_core::config::InputPolicy;
//! use billing_core::validation::{normalize_quantity, parse_money};
//!
//! assert_eq!(normalize_quantity(InputPolicy::Coerce, 0).unwrap(), 1);
//! assert!(normalize_quantity(InputPolicy::Strict, 0).is_err());
//! assert_eq!(parse_money("price", "10.5").unwrap().cents(), 1050);
//! ```

use chrono::{DateTime, Utc};

use crate::config::InputPolicy;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    LedgerEntry, NewItem, NewPurchase, NewSale, NewSaleOrder, NewStakeholder, OrderLine,
    StakeholderRole,
};
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_DISCOUNT_BPS: u32 = 10_000;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates an item name and returns it trimmed.
///
/// ```rust
/// use billing_core::validation::validate_item_name;
///
/// assert_eq!(validate_item_name("  Widget ").unwrap(), "Widget");
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    validate_name("item name", name)
}

pub fn validate_stakeholder_name(name: &str) -> ValidationResult<String> {
    validate_name("stakeholder name", name)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_DISCOUNT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: MAX_DISCOUNT_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a new item and returns it with its name trimmed.
pub fn validate_new_item(item: &NewItem) -> ValidationResult<NewItem> {
    let name = validate_item_name(&item.name)?;
    validate_price_cents(item.sale_price_cents)?;
    validate_non_negative("stock quantity", item.stock_qty)?;
    validate_non_negative("minimum stock level", item.min_stock_level)?;

    Ok(NewItem {
        name,
        ..item.clone()
    })
}

/// Validates a stakeholder and returns it normalized: name and contact
/// fields trimmed, seller discount forced to zero.
pub fn validate_new_stakeholder(stakeholder: &NewStakeholder) -> ValidationResult<NewStakeholder> {
    let name = validate_stakeholder_name(&stakeholder.name)?;
    validate_discount_bps(stakeholder.discount_bps)?;

    let discount_bps = match stakeholder.role {
        StakeholderRole::Buyer => stakeholder.discount_bps,
        StakeholderRole::Seller => 0,
    };

    Ok(NewStakeholder {
        name,
        contact_number: stakeholder.contact_number.trim().to_string(),
        address: stakeholder.address.trim().to_string(),
        role: stakeholder.role,
        discount_bps,
    })
}

// =============================================================================
// Normalization
// =============================================================================

/// Applies the input policy to a quantity.
///
/// | policy | qty ≤ 0                 |
/// |--------|-------------------------|
/// | Coerce | becomes 1               |
/// | Strict | `MustBePositive` error  |
pub fn normalize_quantity(policy: InputPolicy, quantity: i64) -> ValidationResult<i64> {
    if quantity > 0 {
        return Ok(quantity);
    }

    match policy {
        InputPolicy::Coerce => Ok(1),
        InputPolicy::Strict => Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }),
    }
}

/// Applies the input policy to a unit price: negative becomes 0 or is rejected.
pub fn normalize_unit_price(policy: InputPolicy, cents: i64) -> ValidationResult<i64> {
    match policy {
        InputPolicy::Coerce => Ok(cents.max(0)),
        InputPolicy::Strict => validate_price_cents(cents).map(|_| cents),
    }
}

/// Non-positive ids mean "no counterparty" under either policy.
pub fn normalize_counterparty(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id > 0)
}

fn normalize_entry(
    policy: InputPolicy,
    now: DateTime<Utc>,
    item_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    date: Option<DateTime<Utc>>,
    counterparty_id: Option<i64>,
) -> ValidationResult<LedgerEntry> {
    let quantity = normalize_quantity(policy, quantity)?;
    let unit_price_cents = normalize_unit_price(policy, unit_price_cents)?;

    if Money::from_cents(unit_price_cents)
        .checked_multiply_quantity(quantity)
        .is_none()
    {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(LedgerEntry {
        item_id,
        quantity,
        unit_price_cents,
        date: date.unwrap_or(now),
        counterparty_id: normalize_counterparty(counterparty_id),
    })
}

pub fn normalize_purchase(
    purchase: &NewPurchase,
    policy: InputPolicy,
    now: DateTime<Utc>,
) -> ValidationResult<LedgerEntry> {
    normalize_entry(
        policy,
        now,
        purchase.item_id,
        purchase.quantity,
        purchase.unit_price_cents,
        purchase.date,
        purchase.seller_id,
    )
}

pub fn normalize_sale(
    sale: &NewSale,
    policy: InputPolicy,
    now: DateTime<Utc>,
) -> ValidationResult<LedgerEntry> {
    normalize_entry(
        policy,
        now,
        sale.item_id,
        sale.quantity,
        sale.unit_price_cents,
        sale.date,
        sale.buyer_id,
    )
}

/// A sale order after validation: buyer resolved, every line normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub buyer_id: i64,
    pub order_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// Validates a sale order payload.
///
/// ## Rules
/// - Buyer must be set (and positive)
/// - At least one line
/// - Each line's quantity and price go through the input policy
/// - Blank notes become `None`
pub fn validate_sale_order(
    order: &NewSaleOrder,
    policy: InputPolicy,
    now: DateTime<Utc>,
) -> ValidationResult<ValidatedOrder> {
    let buyer_id = normalize_counterparty(order.buyer_id).ok_or_else(|| {
        ValidationError::Required {
            field: "buyer".to_string(),
        }
    })?;

    if order.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "order lines".to_string(),
        });
    }

    let lines = order
        .lines
        .iter()
        .map(|line| {
            Ok(OrderLine {
                item_id: line.item_id,
                quantity: normalize_quantity(policy, line.quantity)?,
                unit_price_cents: normalize_unit_price(policy, line.unit_price_cents)?,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    let notes = order
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(ValidatedOrder {
        buyer_id,
        order_date: order.order_date.unwrap_or(now),
        notes,
        lines,
    })
}

// =============================================================================
// Text Parsing
// =============================================================================

/// Parses decimal currency text into Money.
///
/// Accepts `"10"`, `"10.5"`, `"10.50"` and a leading `-`. At most two
/// fractional digits; no grouping separators.
pub fn parse_money(field: &str, text: &str) -> ValidationResult<Money> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (major_text, minor_text) = match digits.split_once('.') {
        Some((major, minor)) => (major, minor),
        None => (digits, ""),
    };

    if major_text.is_empty() && minor_text.is_empty() {
        return Err(invalid("expected a number"));
    }
    if !major_text.chars().all(|c| c.is_ascii_digit())
        || !minor_text.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("expected a number"));
    }
    if minor_text.len() > 2 {
        return Err(invalid("at most two decimal places"));
    }

    let major: i64 = if major_text.is_empty() {
        0
    } else {
        major_text.parse().map_err(|_| invalid("amount too large"))?
    };
    let minor: i64 = match minor_text.len() {
        0 => 0,
        1 => minor_text.parse::<i64>().map_err(|_| invalid("expected a number"))? * 10,
        _ => minor_text.parse().map_err(|_| invalid("expected a number"))?,
    };

    let cents = major
        .checked_mul(100)
        .and_then(|c| c.checked_add(minor))
        .ok_or_else(|| invalid("amount too large"))?;

    Ok(Money::from_cents(if negative { -cents } else { cents }))
}

/// Parses integer quantity text.
pub fn parse_quantity(text: &str) -> ValidationResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "expected a whole number".to_string(),
        })
}
