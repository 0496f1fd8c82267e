//! # billing-core: Pure Business Logic for OM Billing
//!
//! Domain types and rules for a small-business billing and inventory system:
//! items and their stock, buyer/seller stakeholders, purchases, sales and
//! multi-line sale orders.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OM Billing Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Forms / Dashboard (external caller)                  │   │
//! │  │   Items ── Stakeholders ── Purchase ── Sale ── Orders ── Stock  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ billing-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   order   │  │ validation│  │   │
//! │  │   │   Item    │  │   Money   │  │  totals   │  │ normalize │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  number   │  │  parsing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      billing-db (SQLite, Unit of Work, Transaction Recorder)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Stakeholder, Purchase, Sale, SaleOrder)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`order`] - Order totals and order-number formatting
//! - [`config`] - Recorder configuration and input policy
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation, normalization and parsing
//!
//! ## Example Usage
//!
//! ```rust
//! use billing_core::money::Money;
//! use billing_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(12_000); // $120.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
//! assert_eq!(tax.cents(), 1_200);
//! ```

pub mod config;
pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{InputPolicy, RecorderConfig};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax applied to sale orders when no other rate is configured: 10%.
pub const DEFAULT_ORDER_TAX_BPS: u32 = 1000;

/// Literal prefix of every generated order number (`ORD20240115001`).
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";

/// How many rows the dashboard's "recent transactions" list shows.
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Longest accepted item or stakeholder name.
pub const MAX_NAME_LEN: usize = 200;
