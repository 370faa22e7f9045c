//! # Pricing Engine
//!
//! Derives subtotal, discount and total from a cart on every read.
//!
//! ```text
//! Cart lines ──► current Catalog prices ──► Σ price × qty = subtotal
//!                                                  │
//!                               DiscountRate ─────►│
//!                                                  ▼
//!                       round_half_up(subtotal × (1 − d)) = total
//! ```
//!
//! Nothing here is cached: a price change in the catalog shows up on the
//! next quote. A cart priced at one moment and checked out after a price
//! change is charged the price current at checkout.

use std::sync::Arc;

use serde::Serialize;
use ts_rs::TS;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Channel, DiscountRate, Product, ProductId, SaleLine};

/// A priced cart line, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl From<&QuoteLine> for SaleLine {
    fn from(line: &QuoteLine) -> Self {
        SaleLine {
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
        }
    }
}

/// A fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub channel: Channel,
    pub lines: Vec<QuoteLine>,
    pub subtotal: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub total: Money,
}

impl CartQuote {
    /// Prices `cart` using `lookup` for each product's current record.
    pub(crate) fn build<F>(cart: &Cart, mut lookup: F) -> CoreResult<CartQuote>
    where
        F: FnMut(ProductId) -> CoreResult<Product>,
    {
        let lines = cart
            .lines()
            .iter()
            .map(|line| {
                let product = lookup(line.product_id)?;
                let unit_price = product.unit_price();
                Ok(QuoteLine {
                    product_id: line.product_id,
                    name: product.name,
                    unit_price,
                    quantity: line.quantity,
                    line_total: unit_price.multiply_quantity(line.quantity),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let discount = cart.discount();
        let total = subtotal.apply_discount(discount);

        Ok(CartQuote {
            channel: cart.channel(),
            lines,
            subtotal,
            discount,
            discount_amount: subtotal - total,
            total,
        })
    }

    pub fn sale_lines(&self) -> Vec<SaleLine> {
        self.lines.iter().map(SaleLine::from).collect()
    }
}

/// Prices carts against the live catalog.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<Catalog>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        PricingEngine { catalog }
    }

    /// Σ unit price × quantity using the catalog's current prices.
    ///
    /// ## Errors
    /// `ProductNotFound` if a line refers to a product the catalog lacks.
    pub fn subtotal(&self, cart: &Cart) -> CoreResult<Money> {
        cart.lines()
            .iter()
            .map(|line| {
                let product = self.catalog.find(line.product_id)?;
                Ok(product.unit_price().multiply_quantity(line.quantity))
            })
            .sum()
    }

    /// Subtotal after the cart discount, rounded half-up to the cent.
    pub fn total(&self, cart: &Cart) -> CoreResult<Money> {
        Ok(self.subtotal(cart)?.apply_discount(cart.discount()))
    }

    /// Amount the discount takes off the subtotal.
    pub fn discount_amount(&self, cart: &Cart) -> CoreResult<Money> {
        Ok(self.subtotal(cart)?.discount_amount(cart.discount()))
    }

    /// Line-by-line breakdown for display.
    pub fn quote(&self, cart: &Cart) -> CoreResult<CartQuote> {
        CartQuote::build(cart, |id| self.catalog.find(id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
