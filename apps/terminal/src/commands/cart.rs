//! # Cart Commands
//!
//! Cart manipulation for the signed-in session.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌────────────┐     ┌───────────┐    │
//! │  │  Empty   │────►│ In Cart  │────►│ Validating │────►│ Committed │    │
//! │  │  (open)  │     │  (open)  │     │            │     │ (cleared) │    │
//! │  └──────────┘     └──────────┘     └────────────┘     └───────────┘    │
//! │       ▲                │                 │                  │           │
//! │       │           add_to_cart            ▼                  │           │
//! │       │           remove_from_cart   ┌──────────┐           │           │
//! │       │           set_discount       │ Rejected │           │           │
//! │       │           set_channel        │ cart kept│           │           │
//! │       │                              └──────────┘           │           │
//! │       │                                  │ any edit         │ any edit  │
//! │       └──────────── clear_cart ◄─────────┴──────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command answers with the full cart so the client never has to
//! recompute totals.

use serde::Serialize;
use tally_core::{Channel, CartQuote, CheckoutState, ProductId};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{lock_session, AppState, Session, SessionHandle};

/// Cart response: session state, priced lines and display totals.
///
/// ## Serialization
/// ```json
/// {
///   "state": "open",
///   "channel": "in-store",
///   "lines": [{"productId": 1, "name": "Coffee", "unitPrice": 350, "quantity": 2, "lineTotal": 700}],
///   "subtotal": 700, "discount": 1000, "discountAmount": 70, "total": 630,
///   "itemCount": 2,
///   "subtotalDisplay": "$7.00", "discountDisplay": "$0.70", "totalDisplay": "$6.30"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(flatten)]
    pub state: CheckoutState,

    #[serde(flatten)]
    pub quote: CartQuote,

    pub item_count: i64,
    pub discount_percent: f64,
    pub subtotal_display: String,
    pub discount_display: String,
    pub total_display: String,
}

impl CartResponse {
    fn build(state: &AppState, session: &Session) -> Result<Self, ApiError> {
        let cart = session.checkout.cart();
        let quote = state.store.pricing().quote(cart)?;
        let config = &state.config;

        Ok(CartResponse {
            state: session.checkout.state(),
            item_count: cart.total_quantity(),
            discount_percent: quote.discount.percent(),
            subtotal_display: config.format_currency(quote.subtotal.cents()),
            discount_display: config.format_currency(quote.discount_amount.cents()),
            total_display: config.format_currency(quote.total.cents()),
            quote,
        })
    }
}

/// Runs `edit` on the session, then answers with the resulting cart.
fn edit_cart<F>(state: &AppState, handle: &SessionHandle, edit: F) -> Result<CartResponse, ApiError>
where
    F: FnOnce(&mut Session) -> Result<(), ApiError>,
{
    let mut session = lock_session(handle);
    edit(&mut session)?;
    CartResponse::build(state, &session)
}

pub fn get_cart(state: &AppState, handle: &SessionHandle) -> Result<CartResponse, ApiError> {
    debug!("get_cart command");
    CartResponse::build(state, &lock_session(handle))
}

/// Adds `quantity` of a product, merging into an existing line.
///
/// Stock is not checked here; checkout is the single point where stock is
/// validated and decremented.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown product
/// - `VALIDATION_ERROR` for quantity < 1, a line over 999 or a cart over 100 lines
pub fn add_to_cart(
    state: &AppState,
    handle: &SessionHandle,
    product_id: u32,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(product_id, quantity, "add_to_cart command");

    edit_cart(state, handle, |session| {
        session
            .checkout
            .add_item(state.store.catalog(), ProductId::new(product_id), quantity)?;
        Ok(())
    })
}

/// Removes a product's line. Removing a product that is not in the cart
/// leaves the cart as it was.
pub fn remove_from_cart(
    state: &AppState,
    handle: &SessionHandle,
    product_id: u32,
) -> Result<CartResponse, ApiError> {
    debug!(product_id, "remove_from_cart command");

    edit_cart(state, handle, |session| {
        if !session.checkout.remove_item(ProductId::new(product_id)) {
            debug!(product_id, "Product not in cart");
        }
        Ok(())
    })
}

pub fn set_discount(
    state: &AppState,
    handle: &SessionHandle,
    percent: f64,
) -> Result<CartResponse, ApiError> {
    debug!(percent, "set_discount command");

    edit_cart(state, handle, |session| {
        session.checkout.set_discount(percent)?;
        Ok(())
    })
}

pub fn set_channel(
    state: &AppState,
    handle: &SessionHandle,
    channel: &str,
) -> Result<CartResponse, ApiError> {
    debug!(channel, "set_channel command");

    let channel: Channel = channel
        .parse()
        .map_err(|e: tally_core::ValidationError| ApiError::validation(e.to_string()))?;
    edit_cart(state, handle, |session| {
        session.checkout.set_channel(channel);
        Ok(())
    })
}

/// Abandons the sale in progress; the channel is kept.
pub fn clear_cart(state: &AppState, handle: &SessionHandle) -> Result<CartResponse, ApiError> {
    debug!("clear_cart command");

    edit_cart(state, handle, |session| {
        session.checkout.clear();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, StoreState};
    use tally_core::{Role, UserIdentity};

    fn setup() -> (AppState, SessionHandle) {
        let state = AppState::new(ConfigState::default(), StoreState::in_memory().unwrap());
        let id = state.sessions.open(
            UserIdentity {
                id: 2,
                username: "cashier".to_string(),
                role: Role::Cashier,
            },
            Channel::InStore,
        );
        let handle = state.sessions.get(id).unwrap();
        (state, handle)
    }

    #[test]
    fn test_coffee_with_discount() {
        let (state, handle) = setup();

        add_to_cart(&state, &handle, 1, 2).unwrap();
        let cart = set_discount(&state, &handle, 10.0).unwrap();

        assert_eq!(cart.state, CheckoutState::Open);
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.quote.subtotal.cents(), 700);
        assert_eq!(cart.quote.total.cents(), 630);
        assert_eq!(cart.total_display, "$6.30");
        assert_eq!(cart.discount_display, "$0.70");

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["channel"], "in-store");
        assert_eq!(json["lines"][0]["lineTotal"], 700);
    }

    #[test]
    fn test_adding_beyond_stock_is_allowed() {
        let (state, handle) = setup();
        let cart = add_to_cart(&state, &handle, 3, 31).unwrap();
        assert_eq!(cart.item_count, 31);
    }

    #[test]
    fn test_invalid_edits_leave_cart_unchanged() {
        let (state, handle) = setup();
        add_to_cart(&state, &handle, 1, 1).unwrap();

        let err = add_to_cart(&state, &handle, 42, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = add_to_cart(&state, &handle, 1, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = set_discount(&state, &handle, 150.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDiscount);

        let err = set_channel(&state, &handle, "fax").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let cart = get_cart(&state, &handle).unwrap();
        assert_eq!(cart.item_count, 1);
        assert!(cart.quote.discount.is_zero());
        assert_eq!(cart.quote.channel, Channel::InStore);
    }

    #[test]
    fn test_remove_and_clear() {
        let (state, handle) = setup();
        add_to_cart(&state, &handle, 1, 1).unwrap();
        add_to_cart(&state, &handle, 2, 1).unwrap();
        set_channel(&state, &handle, "online").unwrap();

        let cart = remove_from_cart(&state, &handle, 1).unwrap();
        assert_eq!(cart.quote.lines.len(), 1);

        let cart = remove_from_cart(&state, &handle, 1).unwrap();
        assert_eq!(cart.quote.lines.len(), 1);

        let cart = clear_cart(&state, &handle).unwrap();
        assert!(cart.quote.lines.is_empty());
        assert_eq!(cart.quote.channel, Channel::Online);
    }
}
