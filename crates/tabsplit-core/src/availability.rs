//! # Availability Filter
//!
//! Picks the items that take part in a finalization pass and re-derives the
//! tax for them.
//!
//! ## Tax Re-derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Receipt as uploaded:  subtotal $30.00   tax $3.00   tip $5.00          │
//! │                                                                         │
//! │  effective rate = tax / subtotal = 3.00 / 30.00 = 10%                   │
//! │                                                                         │
//! │  Item B ($10) marked unavailable                                        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  available subtotal = $20.00                                            │
//! │  adjusted tax       = $20.00 × 10% = $2.00                              │
//! │  tip                = $5.00 (never prorated)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rate is applied as the exact fraction `tax / subtotal`, not a rounded
//! percentage, so a receipt with nothing unavailable keeps its tax unchanged.

use tracing::warn;

use crate::money::Money;
use crate::types::{Item, ReceiptTotals, TaxRate};
use crate::validation::MAX_AMOUNT_CENTS;

/// Items and amounts that take part in one finalization pass.
#[derive(Debug, Clone)]
pub struct AvailableSet<'a> {
    /// Available items, in receipt order.
    pub items: Vec<&'a Item>,
    /// Σ total_price over `items`.
    pub subtotal: Money,
    /// Tax at the receipt's effective rate, applied to `subtotal`.
    pub adjusted_tax: Money,
    /// Tip, passed through unchanged.
    pub tip: Money,
}

impl AvailableSet<'_> {
    /// Whether no item is available.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Filters `items` down to the available ones and derives the adjusted tax.
pub fn filter_available<'a>(items: &'a [Item], totals: &ReceiptTotals) -> AvailableSet<'a> {
    let available: Vec<&Item> = items.iter().filter(|item| item.available).collect();

    let subtotal: Money = available
        .iter()
        .map(|item| {
            if item.total_price.is_negative() {
                warn!(item_id = %item.id, price = %item.total_price, "Negative item price treated as zero");
            }
            item.total_price.non_negative()
        })
        .sum();

    AvailableSet {
        items: available,
        subtotal,
        adjusted_tax: adjusted_tax(subtotal, totals.subtotal, totals.tax),
        tip: totals.tip.non_negative(),
    }
}

/// Applies the rate `original_tax / original_subtotal` to `available_subtotal`,
/// rounding half-up to the cent.
///
/// A zero original subtotal means a zero rate. The result is capped at
/// `MAX_AMOUNT_CENTS`, which only bites when items add up to far more than
/// the recorded subtotal.
///
/// ## Example
/// ```rust
/// use tabsplit_core::availability::adjusted_tax;
/// use tabsplit_core::money::Money;
///
/// let tax = adjusted_tax(
///     Money::from_cents(2000),
///     Money::from_cents(3000),
///     Money::from_cents(300),
/// );
/// assert_eq!(tax.cents(), 200);
/// ```
pub fn adjusted_tax(available_subtotal: Money, original_subtotal: Money, original_tax: Money) -> Money {
    if !original_subtotal.is_positive() {
        return Money::zero();
    }
    let tax = available_subtotal
        .non_negative()
        .mul_div_round(original_tax.non_negative().cents(), original_subtotal.cents());
    if tax.cents() > MAX_AMOUNT_CENTS {
        warn!(tax = %tax, "Adjusted tax above the amount ceiling; capping");
        return Money::from_cents(MAX_AMOUNT_CENTS);
    }
    tax
}

/// The receipt's implied tax rate, rounded to basis points, for display.
pub fn effective_tax_rate(totals: &ReceiptTotals) -> TaxRate {
    TaxRate::implied(totals.tax, totals.subtotal)
}

// =============================================================================
// Unit Tests
// =============================================================================
