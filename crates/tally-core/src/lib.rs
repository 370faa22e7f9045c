//! # tally-core: Point-of-Sale Domain Model for Tally
//!
//! Catalog, carts, pricing, checkout and the sales ledger, with no I/O of
//! its own. Storage and authentication are reached through [`ports`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              tally-terminal (JSON lines on stdin/stdout)        │   │
//! │  │    login ──► add_to_cart ──► set_discount ──► checkout         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────────┐  │   │
//! │  │   │ catalog │  │  cart   │  │ pricing │  │ checkout/session │  │   │
//! │  │   │ Catalog │  │  Cart   │  │ Engine  │  │  Processor       │  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────────────┘  │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────────┐  │   │
//! │  │   │  money  │  │  types  │  │ ledger  │  │      ports       │  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PersistenceStore / Authenticator       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            tally-store (memory, JSON files, argon2)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, DiscountRate, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Shared product catalog and stock transactions
//! - [`cart`] - Per-session cart
//! - [`pricing`] - Subtotal, discount and total on demand
//! - [`session`] - Checkout lifecycle of one cart
//! - [`checkout`] - All-or-nothing commit of a cart to a sale
//! - [`ledger`] - Append-only sales history and analytics
//! - [`ports`] - Traits for persistence and authentication
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_core::{Catalog, CheckoutProcessor, CheckoutSession, Product, ProductId, SalesLedger};
//!
//! let catalog = Arc::new(Catalog::new(vec![Product::new(1, "Coffee", 350, 100)]).unwrap());
//! let processor = CheckoutProcessor::new(catalog.clone(), Arc::new(SalesLedger::new()));
//!
//! let mut session = CheckoutSession::new();
//! session.add_item(&catalog, ProductId::new(1), 2).unwrap();
//! session.set_discount(10.0).unwrap();
//!
//! let sale = processor.checkout(&mut session, None).unwrap();
//! assert_eq!(sale.total.to_string(), "$6.30");
//! assert_eq!(catalog.find(ProductId::new(1)).unwrap().stock, 98);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ledger;
pub mod money;
pub mod ports;
pub mod pricing;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use catalog::{Catalog, StockTransaction};
pub use checkout::CheckoutProcessor;
pub use error::{CoreError, CoreResult, StockShortfall, ValidationError};
pub use ledger::{ChannelRevenue, ProductUnits, SalesLedger, SalesSummary};
pub use money::Money;
pub use ports::{Authenticator, PersistenceStore};
pub use pricing::{CartQuote, PricingEngine, QuoteLine};
pub use session::{CheckoutSession, CheckoutState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on one cart line
///
/// ## Business Reason
/// Catches typos at the till (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price in cents ($1,000,000).
///
/// Keeps a full cart of maximum-quantity lines well inside `i64` cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
