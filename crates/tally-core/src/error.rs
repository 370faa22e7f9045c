//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Catalog, cart, checkout and auth failures      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-store errors (separate crate)                                   │
//! │  └── StoreError       - File / hashing failures                        │
//! │                                                                         │
//! │  Terminal API errors (in app)                                          │
//! │  └── ApiError         - What the presentation layer sees (serialized)  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Presentation layer     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable by the user. None of them is fatal to the
//! process.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::ProductId;

// =============================================================================
// Stock Shortfall
// =============================================================================

/// One cart line that cannot be fulfilled from current stock.
///
/// Checkout collects one of these for every failing line instead of stopping
/// at the first, so the cashier can fix the whole cart in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub requested: i64,
    pub available: i64,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product with this id exists in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// One or more lines ask for more than is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: 2 × Sandwich
    ///      │
    ///      ▼
    /// checkout(): available = 1
    ///      │
    ///      ▼
    /// InsufficientStock([{ productId: 2, requested: 2, available: 1 }])
    ///      │
    ///      ▼
    /// UI shows: "Only 1 Sandwich in stock"
    /// ```
    #[error("Insufficient stock for {} line(s): {}", .0.len(), describe_shortfalls(.0))]
    InsufficientStock(Vec<StockShortfall>),

    /// Discount percent outside 0..=100, finer than 0.01%, or not a number.
    #[error("Invalid discount {0}: must be between 0 and 100 percent in steps of 0.01")]
    InvalidDiscount(f64),

    /// Checkout attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// An idempotency key already committed a sale for different lines.
    ///
    /// Keys are global to the process, so two tills reusing one key land here
    /// instead of the second till receiving the first till's receipt.
    #[error("Idempotency key '{0}' was already used for a different sale")]
    IdempotencyKeyReused(String),

    /// Username/password pair did not match any user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A product id or barcode appears twice in the catalog.
    #[error("Duplicate {field}: '{value}' already exists in the catalog")]
    DuplicateProduct { field: String, value: String },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The persistence collaborator failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn describe_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "product {} (requested {}, available {})",
                s.product_id, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., barcode with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
