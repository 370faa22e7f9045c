//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  stdin                       Rust Backend                               │
//! │  ─────                       ────────────                               │
//! │                                                                         │
//! │  {"command":"checkout","sessionId":"..."}                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store Error? ─── StoreError::Io(..) ───────────────┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Domain Error? ── CoreError::InsufficientStock ── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stdout                                                                 │
//! │  {"ok":false,"error":{"code":"INSUFFICIENT_STOCK",                     │
//! │                       "message":"...","shortfalls":[...]}}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tally_core::{CoreError, StockShortfall};
use tally_store::StoreError;

/// API error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 7"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-line detail for `INSUFFICIENT_STOCK`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<StockShortfall>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, sale or session not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// One or more lines exceed stock
    InsufficientStock,

    /// Discount outside 0..=100 %
    InvalidDiscount,

    /// Checkout with nothing in the cart
    EmptyCart,

    /// Bad credentials or missing session
    Unauthorized,

    /// Signed in, but the role does not allow this
    Forbidden,

    /// Persistence collaborator failed
    StorageError,

    /// Request line could not be understood
    BadRequest,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            shortfalls: Vec::new(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(action: &str) -> Self {
        ApiError::new(ErrorCode::Forbidden, format!("Not allowed to {action}"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::InsufficientStock(shortfalls) => ApiError {
                code: ErrorCode::InsufficientStock,
                message,
                shortfalls,
            },
            CoreError::InvalidDiscount(_) => ApiError::new(ErrorCode::InvalidDiscount, message),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, message),
            CoreError::IdempotencyKeyReused(_) => ApiError::bad_request(message),
            CoreError::InvalidCredentials => ApiError::unauthorized(message),
            CoreError::DuplicateProduct { .. } | CoreError::QuantityTooLarge { .. } => {
                ApiError::validation(message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::Store(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Store failure: {}", e);
                ApiError::new(ErrorCode::StorageError, "Storage operation failed")
            }
        }
    }
}

/// Converts store errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store failure: {}", err);
        ApiError::new(ErrorCode::StorageError, "Storage operation failed")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ProductId;

    #[test]
    fn test_insufficient_stock_keeps_detail() {
        let err: ApiError = CoreError::InsufficientStock(vec![StockShortfall {
            product_id: ProductId::new(2),
            requested: 2,
            available: 1,
        }])
        .into();

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(
            json["shortfalls"],
            serde_json::json!([{"productId": 2, "requested": 2, "available": 1}])
        );
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let err: ApiError = CoreError::EmptyCart.into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert!(json.get("shortfalls").is_none());

        let err: ApiError = CoreError::InvalidDiscount(120.0).into();
        assert_eq!(err.code, ErrorCode::InvalidDiscount);

        let err: ApiError = CoreError::IdempotencyKeyReused("k1".to_string()).into();
        assert_eq!(serde_json::to_value(&err).unwrap()["code"], "BAD_REQUEST");
    }

    #[test]
    fn test_store_errors_hide_detail() {
        let err: ApiError = CoreError::Store("disk full at /var/tally".to_string()).into();
        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(!err.message.contains("/var/tally"));
    }
}
