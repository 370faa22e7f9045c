//! # Sale Commands
//!
//! Checkout and the receipt it produces.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Flow                                        │
//! │                                                                         │
//! │  {"command":"checkout","idempotencyKey":"till-01-0042"}                │
//! │       │                                                                 │
//! │       ▼  (blocking pool)                                               │
//! │  lock session ──► CheckoutProcessor::checkout                          │
//! │                      │                                                  │
//! │                      ├─ key seen, same cart ► same Sale, no decrement  │
//! │                      ├─ key seen, other cart ► BAD_REQUEST, cart kept  │
//! │                      ├─ empty cart ────────► EMPTY_CART                │
//! │                      ├─ any line short ────► INSUFFICIENT_STOCK        │
//! │                      │                       (every short line listed) │
//! │                      └─ decrement all, record Sale, clear cart         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReceiptResponse                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use tally_core::{Channel, IdempotencyKey, Sale, SaleId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{lock_session, AppState, ConfigState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub sale_id: SaleId,
    pub store_name: String,
    pub terminal_id: String,
    pub timestamp: String,
    pub channel: Channel,
    pub items: Vec<ReceiptItem>,
    pub subtotal_cents: i64,
    pub discount_percent: f64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub total_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl ReceiptResponse {
    pub fn new(sale: &Sale, config: &ConfigState) -> Self {
        ReceiptResponse {
            sale_id: sale.id,
            store_name: config.store_name.clone(),
            terminal_id: config.terminal_id.clone(),
            timestamp: sale.timestamp.to_rfc3339(),
            channel: sale.channel,
            items: sale
                .lines
                .iter()
                .map(|line| ReceiptItem {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    line_total_cents: line.line_total().cents(),
                })
                .collect(),
            subtotal_cents: sale.subtotal.cents(),
            discount_percent: sale.discount.percent(),
            discount_cents: sale.discount_amount().cents(),
            total_cents: sale.total.cents(),
            total_display: config.format_currency(sale.total.cents()),
        }
    }
}

/// Checks out the session's cart.
///
/// Runs on the blocking pool because it waits on the catalog lock. A retry
/// carrying the same `idempotency_key` gets the original receipt back.
///
/// ## Errors
/// - `EMPTY_CART`
/// - `INSUFFICIENT_STOCK` with one shortfall per line that cannot be filled;
///   the cart is kept so the cashier can fix it
/// - `BAD_REQUEST` when the key already belongs to a sale of different lines
pub async fn checkout(
    state: Arc<AppState>,
    session_id: Uuid,
    idempotency_key: Option<String>,
) -> Result<ReceiptResponse, ApiError> {
    debug!(session_id = %session_id, key = ?idempotency_key, "checkout command");

    let key = idempotency_key.map(IdempotencyKey::new);
    tokio::task::spawn_blocking(move || -> Result<ReceiptResponse, ApiError> {
        let handle = state.sessions.get(session_id)?;
        let mut session = lock_session(&handle);

        let sale = state
            .store
            .processor()
            .checkout(&mut session.checkout, key.as_ref())?;

        info!(
            sale_id = %sale.id,
            user_id = session.user.id,
            terminal = %state.config.terminal_id,
            total = %sale.total,
            "Sale completed"
        );
        Ok(ReceiptResponse::new(&sale, &state.config))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Checkout task failed: {e}")))?
}
