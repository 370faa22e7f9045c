//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    3.50 × 2 × (1 − 10/100) = 6.3000000000000007                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    700 cents × 9000 bps / 10000 = 630 cents, exactly                   │
//! │                                                                         │
//! │  Intermediate values stay exact (i128 numerators); the ONLY rounding    │
//! │  step is the final division, done round-half-up at display/commit.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::DiscountRate;
//!
//! let price = Money::from_cents(350); // $3.50
//! let subtotal = price * 2;           // $7.00
//!
//! let total = subtotal.apply_discount(DiscountRate::from_bps(1000));
//! assert_eq!(total.cents(), 630);     // $6.30
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::DiscountRate;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts shown as deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.unit_price ──► CartQuote line total ──► subtotal
///                                                    │
///                           DiscountRate ───────────►│
///                                                    ▼
///                                           total ──► Sale.total ──► Ledger
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(599); // Represents $5.99
    /// assert_eq!(price.cents(), 599);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(350); // Coffee $3.50
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// `amount × (10000 − bps) / 10000`, rounded half-up once. Nothing is
    /// rounded before this point.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_cents(1198); // $11.98
    /// // 11.98 × 0.875 = 10.4825 → $10.48
    /// let total = subtotal.apply_discount(DiscountRate::from_bps(1250));
    /// assert_eq!(total.cents(), 1048);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        let keep_bps = BPS_SCALE - i128::from(rate.bps());
        Money::from_cents(div_round_half_up(
            i128::from(self.0) * keep_bps,
            BPS_SCALE,
        ))
    }

    /// Amount taken off by a discount (`self - self.apply_discount(rate)`).
    ///
    /// Derived from the rounded total so that `subtotal - discount == total`
    /// always holds on a receipt.
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        *self - self.apply_discount(rate)
    }

    /// Divides a total across `count` items, rounding half-up.
    ///
    /// Returns `None` when `count` is zero rather than dividing by zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1001).average_over(2), Some(Money::from_cents(501)));
    /// assert_eq!(Money::from_cents(1000).average_over(0), None);
    /// ```
    pub fn average_over(&self, count: usize) -> Option<Money> {
        if count == 0 {
            return None;
        }
        let count = i128::try_from(count).ok()?;
        Some(Money::from_cents(div_round_half_up(i128::from(self.0), count)))
    }
}

/// Integer division with round-half-up (away from zero on .5 for positive
/// numerators, towards +inf for negative ones).
fn div_round_half_up(numerator: i128, denominator: i128) -> i64 {
    let doubled = numerator * 2 + denominator;
    let quotient = doubled.div_euclid(denominator * 2);
    // Totals in cents never approach i64::MAX; saturate rather than wrap.
    i64::try_from(quotient).unwrap_or(if quotient.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For real UI display use the terminal's `format_currency`, which honours
/// the configured currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(630)), "$6.30");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_discount_ten_percent_on_coffee() {
        let subtotal = Money::from_cents(700);
        let rate = DiscountRate::from_bps(1000);
        assert_eq!(subtotal.apply_discount(rate).cents(), 630);
        assert_eq!(subtotal.discount_amount(rate).cents(), 70);
    }

    #[test]
    fn test_discount_rounds_half_up_only_at_the_end() {
        // 5.99 × 3 = 17.97; 17.97 × 0.85 = 15.2745 → 15.27
        let subtotal = Money::from_cents(599) * 3;
        assert_eq!(subtotal.apply_discount(DiscountRate::from_bps(1500)).cents(), 1527);

        // 0.05 × 0.5 = 0.025 → 0.03 (half-up, not banker's 0.02)
        let tiny = Money::from_cents(5);
        assert_eq!(tiny.apply_discount(DiscountRate::from_bps(5000)).cents(), 3);
    }

    #[test]
    fn test_discount_bounds() {
        let subtotal = Money::from_cents(1234);
        assert_eq!(subtotal.apply_discount(DiscountRate::zero()), subtotal);
        assert_eq!(
            subtotal.apply_discount(DiscountRate::from_bps(10_000)),
            Money::zero()
        );
    }

    #[test]
    fn test_average_over() {
        assert_eq!(
            Money::from_cents(21547).average_over(2),
            Some(Money::from_cents(10774))
        );
        assert_eq!(Money::from_cents(999).average_over(3), Some(Money::from_cents(333)));
        assert_eq!(Money::zero().average_over(0), None);
    }

    #[test]
    fn test_div_round_half_up_negative() {
        assert_eq!(div_round_half_up(-5, 2), -2);
        assert_eq!(div_round_half_up(-7, 2), -3);
        assert_eq!(div_round_half_up(7, 2), 4);
    }
}
