//! # Error Types
//!
//! Domain-specific error types for billing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billing-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule failures (stock, conflicts)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  billing-db errors (separate crate)                                    │
//! │  ├── DbError          - Storage failures                               │
//! │  └── BillingError     - What every public operation returns            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain lookups that came back empty.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Stakeholder not found: {0}")]
    StakeholderNotFound(i64),

    #[error("Sale order not found: {0}")]
    SaleOrderNotFound(i64),

    /// Insufficient stock to complete a sale or order line.
    ///
    /// ## When This Occurs
    /// Detected inside the unit of work, after re-reading the item's stock.
    /// The whole unit is rolled back.
    ///
    /// ```text
    /// AddSale(Widget, qty: 3)
    ///      │
    ///      ▼
    /// Re-fetch stock inside transaction: 2
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Widget", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// ROLLBACK (no sale row, stock unchanged)
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// A delete was refused because other records still point at the entity.
    #[error("Cannot delete {entity} {id}: {reason}")]
    Conflict {
        entity: String,
        id: i64,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Conflict error for a blocked delete.
    pub fn conflict(entity: impl Into<String>, id: i64, reason: impl Into<String>) -> Self {
        CoreError::Conflict {
            entity: entity.into(),
            id,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any unit of work opens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Unparseable input (e.g. "12.3.4" as a price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Reference to a stakeholder with the other role (a seller as an
    /// order's buyer).
    #[error("{field} {id} is not a {expected}")]
    WrongRole {
        field: String,
        id: i64,
        expected: String,
    },

    /// Duplicate value (e.g. duplicate item name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            item: "Widget".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget: available 2, requested 3"
        );
    }

    #[test]
    fn test_conflict_message() {
        let err = CoreError::conflict("item", 7, "it has associated sales or purchases");
        assert_eq!(
            err.to_string(),
            "Cannot delete item 7: it has associated sales or purchases"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "buyer".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: buyer is required");
    }
}
