//! # Domain Types
//!
//! Core domain types used throughout OM Billing.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │   Stakeholder   │   │    SaleOrder    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  item_id        │   │  stakeholder_id │   │  order_number   │       │
//! │  │  name (unique)  │   │  role           │   │  subtotal/tax   │       │
//! │  │  stock_qty      │   │  discount_bps   │   │  items[]        │       │
//! │  └────────┬────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │           │  item_id            │ seller/buyer        │ each line      │
//! │  ┌────────┴────────┐   ┌────────┴────────┐            │ materializes   │
//! │  │    Purchase     │   │      Sale       │◄───────────┘ a Sale row     │
//! │  │  stock += qty   │   │  stock -= qty   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identities are integer surrogates assigned by the database.

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (1 bps = 0.01%).
///
/// 1000 bps = 10%, the rate sale orders carry by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (config input only).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_ORDER_TAX_BPS)
    }
}

// =============================================================================
// Item
// =============================================================================

/// Stock level of an item relative to its reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Nothing on hand (stock ≤ 0).
    OutOfStock,
    /// At or below the minimum stock level.
    Low,
    Healthy,
}

/// An item carried in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub item_id: i64,

    /// Unique display label.
    pub name: String,

    /// Default selling price in cents.
    pub sale_price_cents: i64,

    /// Current on-hand quantity. Authoritative running total.
    pub stock_qty: i64,

    /// Reorder threshold (informational).
    pub min_stock_level: i64,
}

impl Item {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.stock_qty <= 0 {
            StockStatus::OutOfStock
        } else if self.stock_qty <= self.min_stock_level {
            StockStatus::Low
        } else {
            StockStatus::Healthy
        }
    }

    /// Checks whether `quantity` units can leave stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_qty >= quantity
    }
}

/// Fields for creating an item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub name: String,
    pub sale_price_cents: i64,
    /// Opening stock.
    pub stock_qty: i64,
    pub min_stock_level: i64,
}

// =============================================================================
// Stakeholder
// =============================================================================

/// Counterparty tag. A stakeholder is exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StakeholderRole {
    Buyer,
    Seller,
}

/// A buyer or seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stakeholder {
    pub stakeholder_id: i64,
    pub name: String,
    pub contact_number: String,
    pub address: String,
    pub role: StakeholderRole,
    /// Discount in basis points, 0..=10000. Always 0 for sellers.
    pub discount_bps: u32,
}

impl Stakeholder {
    /// Discount as a percentage (for display only).
    pub fn discount_percentage(&self) -> f64 {
        self.discount_bps as f64 / 100.0
    }

    /// Price after this stakeholder's discount.
    pub fn discounted(&self, price: Money) -> Money {
        price.apply_percentage_discount(self.discount_bps)
    }
}

/// Fields for creating a stakeholder.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStakeholder {
    pub name: String,
    pub contact_number: String,
    pub address: String,
    pub role: StakeholderRole,
    pub discount_bps: u32,
}

// =============================================================================
// Purchase / Sale
// =============================================================================

/// A single-line purchase. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub purchase_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub seller_id: Option<i64>,
}

impl Purchase {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A single-line sale. Immutable once recorded.
///
/// Rows created by a sale order carry that order's id in `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub sale_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub buyer_id: Option<i64>,
    pub order_id: Option<i64>,
}

impl Sale {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Purchase joined with display names, for history grids.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseRecord {
    pub purchase_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
}

/// Sale joined with display names, for history grids.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleRecord {
    pub sale_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub buyer_id: Option<i64>,
    pub buyer_name: Option<String>,
    pub order_id: Option<i64>,
}

/// Caller payload for recording a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchase {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `None` → now.
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub seller_id: Option<i64>,
}

/// Caller payload for recording a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `None` → now.
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub buyer_id: Option<i64>,
}

/// A purchase or sale line after input normalization, ready to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub date: DateTime<Utc>,
    pub counterparty_id: Option<i64>,
}

// =============================================================================
// Sale Order
// =============================================================================

/// Lifecycle state of a sale order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Written, stock deducted. Orders are created complete.
    #[default]
    Completed,
}

/// One requested line of a sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// `None` when quantity × price overflows.
    pub fn checked_line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_multiply_quantity(self.quantity)
    }
}

/// Caller payload for creating a sale order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleOrder {
    pub buyer_id: Option<i64>,
    /// `None` → now.
    #[ts(as = "Option<String>")]
    pub order_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// A persisted sale order header plus its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleOrder {
    pub order_id: i64,
    /// `ORD` + yyyyMMdd + 3-digit daily sequence.
    pub order_number: String,
    pub stakeholder_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleOrderItem>,
}

impl SaleOrder {
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleOrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Reporting
// =============================================================================

/// Calendar that decides which business day or month an instant falls in.
///
/// Instants are stored in UTC; order-number days and dashboard months are
/// read on this calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusinessCalendar {
    /// The machine's time zone, DST included.
    #[default]
    Local,
    /// Fixed offset east of UTC in minutes (India is 330).
    Fixed { offset_minutes: i32 },
}

impl BusinessCalendar {
    pub const UTC: BusinessCalendar = BusinessCalendar::Fixed { offset_minutes: 0 };

    /// A fixed-offset calendar; `None` unless the offset is under 24 hours.
    pub fn fixed(offset_minutes: i32) -> Option<Self> {
        (offset_minutes.abs() < 24 * 60).then_some(BusinessCalendar::Fixed { offset_minutes })
    }

    /// Calendar day that `instant` falls on.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match *self {
            BusinessCalendar::Local => instant.with_timezone(&Local).date_naive(),
            BusinessCalendar::Fixed { offset_minutes } => {
                (instant.naive_utc() + Duration::minutes(i64::from(offset_minutes))).date()
            }
        }
    }

    /// First instant of `date` on this calendar.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match *self {
            BusinessCalendar::Local => match Local.from_local_datetime(&midnight).earliest() {
                Some(start) => start.with_timezone(&Utc),
                // Midnight skipped by a DST change
                None => {
                    let offset = Local.offset_from_utc_datetime(&midnight).local_minus_utc();
                    midnight.and_utc() - Duration::seconds(i64::from(offset))
                }
            },
            BusinessCalendar::Fixed { offset_minutes } => {
                midnight.and_utc() - Duration::minutes(i64::from(offset_minutes))
            }
        }
    }
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange { start, end }
    }

    /// The month containing `instant` on `calendar`: from the first of the
    /// month at local midnight up to the first of the next month.
    pub fn month_of(instant: DateTime<Utc>, calendar: BusinessCalendar) -> Self {
        let day = calendar.date_of(instant);
        let first = day.with_day(1).unwrap_or(day);
        let next = first.checked_add_months(Months::new(1)).unwrap_or(first);

        DateRange {
            start: calendar.start_of(first),
            end: calendar.start_of(next),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Which ledger a recent-transaction row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Sale,
}

/// One row of the dashboard's recent-activity list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecentTransaction {
    pub kind: TransactionKind,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub item_name: String,
    pub quantity: i64,
    pub amount_cents: i64,
    pub counterparty: Option<String>,
}

/// Month-to-date figures shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub period: DateRange,
    pub purchases_cents: i64,
    pub sales_cents: i64,
    pub total_stock: i64,
    /// Sales minus purchases for the period.
    pub balance_cents: i64,
    pub recent: Vec<RecentTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn widget(stock: i64) -> Item {
        Item {
            item_id: 1,
            name: "Widget".to_string(),
            sale_price_cents: 1000,
            stock_qty: stock,
            min_stock_level: 2,
        }
    }

    #[test]
    fn test_tax_rate_default_is_ten_percent() {
        assert_eq!(TaxRate::default().bps(), 1000);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(widget(0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(widget(-1).stock_status(), StockStatus::OutOfStock);
        assert_eq!(widget(2).stock_status(), StockStatus::Low);
        assert_eq!(widget(3).stock_status(), StockStatus::Healthy);
    }

    #[test]
    fn test_can_sell() {
        let item = widget(5);
        assert!(item.can_sell(5));
        assert!(!item.can_sell(6));
    }

    #[test]
    fn test_stakeholder_discount() {
        let buyer = Stakeholder {
            stakeholder_id: 1,
            name: "B1".to_string(),
            contact_number: String::new(),
            address: String::new(),
            role: StakeholderRole::Buyer,
            discount_bps: 500,
        };
        assert_eq!(buyer.discounted(Money::from_cents(2000)).cents(), 1900);
        assert!((buyer.discount_percentage() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_month_range() {
        let instant = Utc.with_ymd_and_hms(2024, 12, 15, 13, 45, 0).unwrap();
        let range = DateRange::month_of(instant, BusinessCalendar::UTC);

        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(range.contains(instant));
        assert!(!range.contains(range.end));
    }

    #[test]
    fn test_month_range_on_fixed_offset() {
        let ist = BusinessCalendar::fixed(330).unwrap();
        // 02:00 on Feb 1 in India
        let early_first = Utc.with_ymd_and_hms(2024, 1, 31, 20, 30, 0).unwrap();
        let range = DateRange::month_of(early_first, ist);

        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 31, 18, 30, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).unwrap());
        assert!(range.contains(early_first));

        let utc_range = DateRange::month_of(early_first, BusinessCalendar::UTC);
        assert!(!utc_range.contains(range.end));
        assert_eq!(utc_range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_business_calendar() {
        assert_eq!(BusinessCalendar::fixed(-480), Some(BusinessCalendar::Fixed { offset_minutes: -480 }));
        assert_eq!(BusinessCalendar::fixed(24 * 60), None);
        assert_eq!(BusinessCalendar::default(), BusinessCalendar::Local);

        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let pacific = BusinessCalendar::fixed(-480).unwrap();
        assert_eq!(pacific.date_of(instant), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        let json = serde_json::to_string(&pacific).unwrap();
        assert_eq!(json, r#"{"kind":"fixed","offset_minutes":-480}"#);
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&StakeholderRole::Buyer).unwrap();
        assert_eq!(json, "\"buyer\"");
    }
}
