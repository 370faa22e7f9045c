//! # Checkout Session
//!
//! One cashier's cart plus where it stands in the checkout lifecycle.
//!
//! ```text
//!            add / remove / discount / channel
//!           ┌───────────────┐
//!           ▼               │
//!        ┌──────┐  checkout  ┌────────────┐   ok   ┌───────────────────┐
//!        │ Open │──────────► │ Validating │──────► │ Committed{saleId} │
//!        └──────┘            └────────────┘        └───────────────────┘
//!           ▲                      │ err                    │ next edit
//!           │                      ▼                        │
//!           │                ┌──────────┐                   │
//!           └────────────────│ Rejected │                   │
//!           │   next edit    └──────────┘                   │
//!           └───────────────────────────────────────────────┘
//! ```
//!
//! `Rejected` records that the last attempt failed; the cart itself is left
//! exactly as it was, so it is editable again straight away.

use serde::Serialize;
use ts_rs::TS;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::types::{Channel, ProductId, SaleId};

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Open,
    Validating,
    Committed {
        #[serde(rename = "saleId")]
        sale_id: SaleId,
    },
    Rejected,
}

impl CheckoutState {
    pub const fn is_committed(&self) -> bool {
        matches!(self, CheckoutState::Committed { .. })
    }
}

/// A cart owned by exactly one session.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    cart: Cart,
    state: CheckoutState,
}

impl CheckoutSession {
    pub fn new() -> Self {
        CheckoutSession::default()
    }

    pub fn for_channel(channel: Channel) -> Self {
        CheckoutSession {
            cart: Cart::for_channel(channel),
            state: CheckoutState::Open,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    // Any edit starts a new sale.
    fn reopen(&mut self) {
        self.state = CheckoutState::Open;
    }

    pub fn add_item(
        &mut self,
        catalog: &Catalog,
        product_id: ProductId,
        quantity: i64,
    ) -> CoreResult<()> {
        self.cart.add_item(catalog, product_id, quantity)?;
        self.reopen();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let removed = self.cart.remove_item(product_id);
        if removed {
            self.reopen();
        }
        removed
    }

    pub fn set_discount(&mut self, percent: f64) -> CoreResult<()> {
        self.cart.set_discount(percent)?;
        self.reopen();
        Ok(())
    }

    pub fn set_channel(&mut self, channel: Channel) {
        self.cart.set_channel(channel);
        self.reopen();
    }

    /// Abandons the sale in progress.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.reopen();
    }

    // Transitions driven by CheckoutProcessor.

    pub(crate) fn begin_validation(&mut self) {
        self.state = CheckoutState::Validating;
    }

    pub(crate) fn commit(&mut self, sale_id: SaleId) {
        self.cart.clear();
        self.state = CheckoutState::Committed { sale_id };
    }

    pub(crate) fn reject(&mut self) {
        self.state = CheckoutState::Rejected;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
