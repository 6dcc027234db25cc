//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Splitting a $10.00 pizza three ways:                                   │
//! │    $3.33 × 3 = $9.99  → Lost $0.01!                                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                         │
//! │    We KNOW we lost 1 cent, and the finalizer hands it out explicitly   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decimal text only exists at the boundary: [`Money::parse_decimal`] on the
//! way in, [`Money::to_decimal_string`] (or the [`decimal`] serde adapter) on
//! the way out.
//!
//! ## Usage
//! ```rust
//! use tabsplit_core::money::Money;
//!
//! let price = Money::parse_decimal("price", "20.00").unwrap();
//! assert_eq!(price.cents(), 2000);
//!
//! // Alice holds 1 of 3 shares: floor(2000 × 1 / 3)
//! let alice = price.mul_div_floor(1, 3);
//! assert_eq!(alice.to_decimal_string(), "6.66");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;
use crate::validation::ValidationResult;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (remainders, diagnostics) may be negative
///   while computing; every value the finalizer emits is clamped to `>= 0`
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Item.total_price ──► Share Allocator ──► per-user subtotal
///                                               │
/// Receipt.tax / tip ──► Finalization Engine ◄───┘
///                              │
///                              ▼
///                   FinalizedShare { subtotal, tax, tip, total }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount such as `"12.34"`, `"12"`, `"$0.5"`.
    ///
    /// ## Rules
    /// - Optional leading `-` and `$`
    /// - Digits, optionally one `.` followed by digits
    /// - More than two fractional digits round half-up to the nearest cent
    ///
    /// `field` names the input in the returned error.
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("tip", "5").unwrap().cents(), 500);
    /// assert_eq!(Money::parse_decimal("tip", "2.5").unwrap().cents(), 250);
    /// assert_eq!(Money::parse_decimal("tip", "3.335").unwrap().cents(), 334);
    /// assert!(Money::parse_decimal("tip", "abc").is_err());
    /// ```
    pub fn parse_decimal(field: &str, input: &str) -> ValidationResult<Money> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let mut text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        let negative = text.starts_with('-');
        if negative {
            text = &text[1..];
        }
        text = text.strip_prefix('$').unwrap_or(text);

        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected digits with an optional decimal point"));
        }

        let overflow = || ValidationError::OutOfRange {
            field: field.to_string(),
            min: i64::MIN / 100,
            max: i64::MAX / 100,
        };

        let mut cents: i64 = 0;
        for digit in whole.bytes() {
            cents = cents
                .checked_mul(10)
                .and_then(|c| c.checked_add(i64::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }
        cents = cents.checked_mul(100).ok_or_else(overflow)?;

        let mut fraction_digits = fraction.bytes().map(|d| i64::from(d - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);
        cents = cents
            .checked_add(tenths * 10 + hundredths + i64::from(round_up))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Formats as a plain two-decimal string (`"13.50"`, `"-0.05"`).
    ///
    /// This is the output format of finalized shares. Use `Display` for the
    /// `$`-prefixed human form.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

    /// Computes `floor(self × numerator / denominator)`.
    ///
    /// Intermediate math is i128 so `cents × weight` can't overflow. Returns
    /// zero when `denominator <= 0`; callers treat that as a zero
    /// contribution.
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::Money;
    ///
    /// // $10.00 split 1:2 → 333 and 666 cents, 1 cent left over
    /// let pizza = Money::from_cents(1000);
    /// assert_eq!(pizza.mul_div_floor(1, 3).cents(), 333);
    /// assert_eq!(pizza.mul_div_floor(2, 3).cents(), 666);
    /// assert_eq!(pizza.mul_div_floor(1, 0).cents(), 0);
    /// ```
    pub fn mul_div_floor(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 {
            return Money::zero();
        }
        let product = self.0 as i128 * numerator as i128;
        Money::saturating_from(product.div_euclid(denominator as i128))
    }

    /// Computes `round_half_up(self × numerator / denominator)`.
    ///
    /// Same zero-denominator contract as [`Money::mul_div_floor`].
    pub fn mul_div_round(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 {
            return Money::zero();
        }
        let product = self.0 as i128 * numerator as i128;
        let den = denominator as i128;
        Money::saturating_from((product * 2 + den).div_euclid(den * 2))
    }

    /// Calculates tax with half-up rounding: `(amount × bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::Money;
    /// use tabsplit_core::types::TaxRate;
    ///
    /// let price = Money::from_cents(1000); // $10.00
    /// let rate = TaxRate::from_bps(825);   // 8.25%
    /// assert_eq!(price.calculate_tax(rate).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::saturating_from(tax_cents)
    }

    /// Narrows an i128 result, clamping to the i64 range.
    fn saturating_from(cents: i128) -> Money {
        Money(i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$10.99` (debugging and CLI output).
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
// Decimal Serde Adapter
// =============================================================================

/// Serializes `Money` as a two-decimal string and accepts strings or JSON
/// numbers when deserializing.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Line {
///     #[serde(with = "tabsplit_core::money::decimal")]
///     price: Money,
/// }
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_decimal_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount as a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse_decimal("amount", v).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            v.checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            i64::try_from(v)
                .map_err(|_| E::custom("amount out of range"))
                .and_then(|v| self.visit_i64(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            if !v.is_finite() {
                return Err(E::custom("amount must be finite"));
            }
            // Boundary-only float: round once to cents, never touched again.
            Ok(Money::from_cents((v * 100.0).round() as i64))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
