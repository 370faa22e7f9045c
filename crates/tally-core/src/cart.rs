//! # Cart
//!
//! The ordered list of lines a cashier is building up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action            Cart Method             Change               │
//! │  ──────────────            ───────────             ──────               │
//! │                                                                         │
//! │  Tap product ────────────► add_item() ───────────► qty += n or push    │
//! │  Tap × on a line ────────► remove_item() ────────► line dropped        │
//! │  Type discount ──────────► set_discount() ───────► 0..=100 % only      │
//! │  Pick channel ───────────► set_channel() ────────► in-store/online/... │
//! │  Cancel sale ────────────► clear() ──────────────► lines + discount    │
//! │                                                                         │
//! │  NOTE: Stock is NOT checked here. Lines are validated against stock    │
//! │        at checkout, where the check and the decrement share one lock.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cart has exactly one owner (its session), so it is a plain value with
//! `&mut self` methods and no interior locking.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::types::{CartLine, Channel, DiscountRate, ProductId};
use crate::validation::{validate_cart_size, validate_quantity};
use crate::MAX_ITEM_QUANTITY;

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - Every line quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_LINES` lines
/// - Discount is within 0..=100 %
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: DiscountRate,
    channel: Channel,
}

impl Cart {
    /// Creates an empty in-store cart with no discount.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Creates an empty cart for a given channel.
    pub fn for_channel(channel: Channel) -> Self {
        Cart {
            channel,
            ..Cart::default()
        }
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the catalog has no such product
    /// - `Validation` if `quantity` is not in 1..=999 or the cart is full
    /// - `QuantityTooLarge` if the merged line would exceed 999
    ///
    /// On error the cart is unchanged.
    ///
    /// ```rust
    /// use tally_core::{Cart, Catalog, Product, ProductId};
    ///
    /// let catalog = Catalog::new(vec![Product::new(1, "Coffee", 350, 100)]).unwrap();
    /// let mut cart = Cart::new();
    /// cart.add_item(&catalog, ProductId::new(1), 1).unwrap();
    /// cart.add_item(&catalog, ProductId::new(1), 1).unwrap();
    /// assert_eq!(cart.line_count(), 1);
    /// assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    /// ```
    pub fn add_item(
        &mut self,
        catalog: &Catalog,
        product_id: ProductId,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;
        catalog.find(product_id)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line.quantity + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = merged;
            return Ok(());
        }

        validate_cart_size(self.lines.len())?;
        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        Ok(())
    }

    /// Removes the whole line for a product, whatever its quantity.
    ///
    /// Returns `false` (and changes nothing) if the product is not in the cart.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Sets the cart-wide discount from a percentage.
    ///
    /// ## Errors
    /// `InvalidDiscount` for anything outside 0..=100; the cart keeps its
    /// previous discount.
    pub fn set_discount(&mut self, percent: f64) -> CoreResult<()> {
        self.discount = DiscountRate::from_percent(percent)?;
        Ok(())
    }

    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
    }

    /// Empties lines and resets the discount. The channel is kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = DiscountRate::zero();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn discount(&self) -> DiscountRate {
        self.discount
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Number of distinct products in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Quantity of one product, 0 if absent.
    pub fn quantity_of(&self, product_id: ProductId) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
