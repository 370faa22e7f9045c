//! # Terminal Commands Module
//!
//! Every command reachable from a request line.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (dispatch + session guards)
//! ├── auth.rs       ◄─── login / logout
//! ├── product.rs    ◄─── Product search, inventory, restock
//! ├── cart.rs       ◄─── Cart manipulation
//! ├── sale.rs       ◄─── Checkout and receipts
//! ├── analytics.rs  ◄─── Sales summary and history
//! └── config.rs     ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  stdin: {"sessionId":"…","command":"add_to_cart","productId":1}        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  protocol::parse_line ──► Envelope { session_id, Request::AddToCart }  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  dispatch()                                                            │
//! │    • login / get_config need no session                                │
//! │    • everything else: session_for() → UNAUTHORIZED if missing          │
//! │    • admin commands: require() → FORBIDDEN for cashiers                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  cart::add_to_cart(&state, &session, …) -> Result<CartResponse, _>     │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  stdout: {"ok":true,"data":{…}}                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Login and checkout do CPU work or hold the catalog lock, so they run on
//! the blocking pool; every other command is a few microseconds of work.

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod config;
pub mod product;
pub mod sale;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tally_core::{Role, UserIdentity};
use uuid::Uuid;

use crate::error::ApiError;
use crate::protocol::Request;
use crate::state::{lock_session, AppState, SessionHandle};

/// Routes one request to its command.
pub async fn dispatch(
    state: &Arc<AppState>,
    session_id: Option<Uuid>,
    request: Request,
) -> Result<Value, ApiError> {
    match request {
        Request::Login { username, password } => {
            to_data(auth::login(Arc::clone(state), username, password).await?)
        }
        Request::GetConfig => to_data(config::get_config(state)),
        Request::Logout => {
            let id = session_id.ok_or_else(sign_in_first)?;
            auth::logout(state, id)?;
            Ok(Value::Null)
        }
        request => {
            let id = session_id.ok_or_else(sign_in_first)?;
            let session = state.sessions.get(id)?;
            let user = lock_session(&session).user.clone();
            dispatch_in_session(state, id, &session, &user, request).await
        }
    }
}

async fn dispatch_in_session(
    state: &Arc<AppState>,
    session_id: Uuid,
    session: &SessionHandle,
    user: &UserIdentity,
    request: Request,
) -> Result<Value, ApiError> {
    match request {
        Request::SearchProducts { query } => to_data(product::search_products(state, &query)?),
        Request::GetProduct {
            product_id,
            barcode,
        } => to_data(product::get_product(state, product_id, barcode.as_deref())?),
        Request::ListInventory => to_data(product::list_inventory(state)),
        Request::AdjustStock { product_id, delta } => {
            require(user, Role::can_manage_inventory, "adjust stock")?;
            to_data(product::adjust_stock(state, product_id, delta)?)
        }

        Request::GetCart => to_data(cart::get_cart(state, session)?),
        Request::AddToCart {
            product_id,
            quantity,
        } => to_data(cart::add_to_cart(state, session, product_id, quantity)?),
        Request::RemoveFromCart { product_id } => {
            to_data(cart::remove_from_cart(state, session, product_id)?)
        }
        Request::SetDiscount { percent } => to_data(cart::set_discount(state, session, percent)?),
        Request::SetChannel { channel } => to_data(cart::set_channel(state, session, &channel)?),
        Request::ClearCart => to_data(cart::clear_cart(state, session)?),

        Request::Checkout { idempotency_key } => {
            to_data(sale::checkout(Arc::clone(state), session_id, idempotency_key).await?)
        }

        Request::SalesSummary => {
            require(user, Role::can_view_analytics, "view sales analytics")?;
            to_data(analytics::sales_summary(state))
        }
        Request::RecentSales { limit } => {
            require(user, Role::can_view_analytics, "view sales history")?;
            to_data(analytics::recent_sales(state, limit))
        }

        Request::Login { .. } | Request::Logout | Request::GetConfig => Err(ApiError::internal(
            "session-free command routed to a session",
        )),
    }
}

/// Fails with `FORBIDDEN` unless the user's role passes `check`.
fn require(user: &UserIdentity, check: fn(&Role) -> bool, action: &str) -> Result<(), ApiError> {
    if check(&user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = user.id, role = ?user.role, action, "Forbidden");
        Err(ApiError::forbidden(action))
    }
}

fn sign_in_first() -> ApiError {
    ApiError::unauthorized("Sign in first")
}

fn to_data<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {e}")))
}
