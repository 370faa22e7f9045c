//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  product_id     │   │  id (sequence)  │       │
//! │  │  name           │   │  quantity ≥ 1   │   │  channel        │       │
//! │  │  unit_price     │   └─────────────────┘   │  lines snapshot │       │
//! │  │  stock ≥ 0      │                         │  subtotal/total │       │
//! │  │  barcode?       │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │    Channel      │   │  UserIdentity   │       │
//! │  │  bps (u32)      │   │  InStore        │   │  username       │       │
//! │  │  1000 = 10%     │   │  Online, Phone  │   │  role           │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

/// Catalog identifier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductId(u32);

impl ProductId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        ProductId(id)
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned, strictly increasing sale number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleId(u32);

impl SaleId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        SaleId(id)
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The id following this one.
    #[inline]
    pub const fn next(&self) -> Self {
        SaleId(self.0 + 1)
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-supplied token that makes a retried checkout safe.
///
/// The same token always maps to the same committed sale; a retry never
/// decrements stock twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        IdempotencyKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Cart-wide discount in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%, so 1000 bps = 10%. Percentages typed by a cashier
/// are converted once at the edge; all arithmetic stays integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

const BPS_TOLERANCE: f64 = 1e-6;

impl DiscountRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points. Values above 100% are clamped.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    /// Creates a rate from a percentage such as `10` or `12.5`.
    ///
    /// The percent must land on a whole basis point; `33.333` is refused
    /// rather than silently becoming 33.33%.
    ///
    /// ## Errors
    /// `InvalidDiscount` when `percent` is NaN, below 0, above 100 or
    /// finer than 0.01%.
    ///
    /// ```rust
    /// use tally_core::types::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_percent(12.5).unwrap().bps(), 1250);
    /// assert_eq!(DiscountRate::from_percent(12.34).unwrap().bps(), 1234);
    /// assert!(DiscountRate::from_percent(33.333).is_err());
    /// assert!(DiscountRate::from_percent(100.01).is_err());
    /// assert!(DiscountRate::from_percent(-1.0).is_err());
    /// ```
    pub fn from_percent(percent: f64) -> CoreResult<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(CoreError::InvalidDiscount(percent));
        }

        let scaled = percent * 100.0;
        let bps = scaled.round();
        // Tolerates binary noise such as 12.34 * 100 = 1233.9999999999998.
        if (scaled - bps).abs() > BPS_TOLERANCE {
            return Err(CoreError::InvalidDiscount(percent));
        }
        // In range, so bps is within 0..=10000 and the cast is exact.
        Ok(DiscountRate(bps as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Channel
// =============================================================================

/// The sales channel a transaction originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    #[default]
    InStore,
    Online,
    Phone,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::InStore, Channel::Online, Channel::Phone];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::InStore => "in-store",
            Channel::Online => "online",
            Channel::Phone => "phone",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::error::ValidationError::InvalidFormat {
                field: "channel".to_string(),
                reason: "must be one of: in-store, online, phone".to_string(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is only ever decremented by checkout and incremented by restock
/// (`Catalog::adjust_stock` with a positive delta).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on the shelf. Never negative.
    pub stock: i64,

    /// Barcode (EAN-13, UPC-A, in-house codes). Unique when present.
    pub barcode: Option<String>,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, price_cents: i64, stock: i64) -> Self {
        Product {
            id: ProductId::new(id),
            name: name.into(),
            price_cents,
            stock,
            barcode: None,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from the shelf.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A (product, quantity) pair in a cart. At most one per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a committed sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: ProductId,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, before discount.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A committed sale. Immutable once recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
    pub lines: Vec<SaleLine>,
    pub subtotal: Money,
    pub discount: DiscountRate,
    pub total: Money,
}

impl Sale {
    /// Sum of quantities over all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Amount taken off by the discount.
    pub fn discount_amount(&self) -> Money {
        self.subtotal - self.total
    }
}

/// Everything about a sale except its id, which only the ledger assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSale {
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
    pub lines: Vec<SaleLine>,
    pub subtotal: Money,
    pub discount: DiscountRate,
    pub total: Money,
}

impl PendingSale {
    pub fn into_sale(self, id: SaleId) -> Sale {
        Sale {
            id,
            timestamp: self.timestamp,
            channel: self.channel,
            lines: self.lines,
            subtotal: self.subtotal,
            discount: self.discount,
            total: self.total,
        }
    }
}

/// Half-open time window `[from, to)` used to query sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Unbounded on both ends.
    pub const fn all() -> Self {
        DateRange { from: None, to: None }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }
}

// =============================================================================
// Users
// =============================================================================

/// Role of a signed-in user. Consulted by the presentation layer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cashier,
}

impl Role {
    pub const fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub const fn can_view_analytics(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Who is signed in at a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: u32,
    pub username: String,
    pub role: Role,
}

// =============================================================================
// Unit Tests
// =============================================================================
