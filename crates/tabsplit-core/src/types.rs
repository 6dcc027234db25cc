//! # Domain Types
//!
//! Core domain types used throughout tabsplit.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │      Item       │   │      Claim      │   │   ReceiptTotals     │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id             │◄──│  item_id        │   │  subtotal           │   │
//! │  │  name           │   │  user_id        │   │  tax                │   │
//! │  │  quantity ≥ 1   │   │  claimed_qty>0  │   │  tip                │   │
//! │  │  total_price≥0  │   └─────────────────┘   │  total              │   │
//! │  │  available      │                         └─────────────────────┘   │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────────────────────────┐    │
//! │  │  ReceiptStatus  │   │  FinalizedSnapshot                       │    │
//! │  │  Open           │   │  shares: user_id → FinalizedShare        │    │
//! │  │  Finalized      │   │  { subtotal, tax, tip, total }           │    │
//! │  └─────────────────┘   └──────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{decimal, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Derives the rate implied by `tax / base`, rounded to the nearest bps.
    ///
    /// Zero (or negative) base yields a zero rate.
    pub fn implied(tax: Money, base: Money) -> Self {
        if !base.is_positive() || tax.is_negative() {
            return TaxRate::zero();
        }
        let bps = Money::from_cents(10_000).mul_div_round(tax.cents(), base.cents());
        TaxRate(u32::try_from(bps.cents()).unwrap_or(u32::MAX))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Item
// =============================================================================

fn default_quantity() -> i64 {
    1
}

fn default_available() -> bool {
    true
}

/// A line item on a receipt.
///
/// `total_price` covers the full `quantity`, not a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: String,

    pub name: String,

    /// Units on the receipt line (>= 1).
    #[serde(default = "default_quantity")]
    pub quantity: i64,

    /// Price for the whole line (>= 0).
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub total_price: Money,

    /// Unavailable items (out of stock, substituted) are billed to nobody.
    #[serde(default = "default_available")]
    pub available: bool,
}

impl Item {
    /// Creates an available item.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        total_price: Money,
    ) -> Self {
        Item {
            id: id.into(),
            name: name.into(),
            quantity,
            total_price,
            available: true,
        }
    }

    /// Builder-style availability flag.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Partial edit of an item's descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub total_price: Option<Money>,
}

// =============================================================================
// Claim
// =============================================================================

fn new_claim_id() -> String {
    Uuid::new_v4().to_string()
}

/// A user's ownership of part of an item.
///
/// `claimed_quantity` is a unit count for plain claims and a relative weight
/// for split items; the allocator treats both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Claim {
    #[serde(default = "new_claim_id")]
    pub id: String,
    pub item_id: String,
    pub user_id: String,
    pub claimed_quantity: i64,
    #[serde(default = "Utc::now")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a fresh claim record.
    pub fn new(item_id: impl Into<String>, user_id: impl Into<String>, claimed_quantity: i64) -> Self {
        Claim {
            id: new_claim_id(),
            item_id: item_id.into(),
            user_id: user_id.into(),
            claimed_quantity,
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Receipt Status
// =============================================================================

/// Lifecycle state of a receipt.
///
/// ```text
/// open ──finalize()──► finalized ──reopen()──► open
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Claims and items may change.
    #[default]
    Open,
    /// A snapshot is authoritative; everything is frozen.
    Finalized,
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptStatus::Open => write!(f, "open"),
            ReceiptStatus::Finalized => write!(f, "finalized"),
        }
    }
}

// =============================================================================
// Receipt Totals
// =============================================================================

/// Monetary fields as recorded when the receipt was uploaded or edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptTotals {
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub subtotal: Money,
    #[serde(with = "decimal", default, alias = "tax_total")]
    #[ts(type = "string")]
    pub tax: Money,
    #[serde(with = "decimal", default, alias = "tip_total")]
    #[ts(type = "string")]
    pub tip: Money,
    /// As printed on the receipt; informational only.
    #[serde(with = "decimal", default)]
    #[ts(type = "string")]
    pub total: Money,
}

impl ReceiptTotals {
    /// Builds totals with `total = subtotal + tax + tip`, saturating at the
    /// i64 bounds. Range checks happen in `validate_totals`.
    pub fn new(subtotal: Money, tax: Money, tip: Money) -> Self {
        let total = subtotal
            .cents()
            .saturating_add(tax.cents())
            .saturating_add(tip.cents());
        ReceiptTotals {
            subtotal,
            tax,
            tip,
            total: Money::from_cents(total),
        }
    }
}

// =============================================================================
// Finalized Output
// =============================================================================

/// One user's slice of a finalized receipt.
///
/// All four values are derived by the finalizer; `total` is always
/// `subtotal + tax + tip`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizedShare {
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub subtotal: Money,
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub tax: Money,
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub tip: Money,
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub total: Money,
}

/// The immutable result of one finalization pass.
///
/// ## Invariant
/// `Σ shares[*].total == allocated_subtotal + adjusted_tax + tip`, to the cent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizedSnapshot {
    /// Per-user shares keyed (and ordered) by user id.
    pub shares: BTreeMap<String, FinalizedShare>,

    /// Sum of available item prices.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub available_subtotal: Money,

    /// Sum of the floored per-user subtotals.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub allocated_subtotal: Money,

    /// Tax re-derived for the available subtotal.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub adjusted_tax: Money,

    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub tip: Money,

    /// Sum of every share's total.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub grand_total: Money,

    /// Price of available items that nobody claimed.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub unclaimed: Money,

    /// Cents dropped by per-item floor division.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub truncated: Money,
}

impl FinalizedSnapshot {
    /// Looks up one user's share.
    pub fn share(&self, user_id: &str) -> Option<&FinalizedShare> {
        self.shares.get(user_id)
    }
}

/// One row of a user's claim breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClaimLine {
    pub item_id: String,
    pub item_name: String,
    pub claimed_quantity: i64,
    /// Sum of every claim's weight on the item.
    pub total_shares: i64,
    /// Floored cents this claim contributes to the user's subtotal.
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub amount: Money,
}

// =============================================================================
// Limits
// =============================================================================

/// Size limits enforced by the receipt aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLimits {
    pub max_items: usize,
    pub max_item_quantity: i64,
    pub max_claimants_per_item: usize,
    /// Upper bound on any single split weight.
    #[serde(default = "default_max_share_weight")]
    pub max_share_weight: i64,
}

fn default_max_share_weight() -> i64 {
    crate::MAX_SHARE_WEIGHT
}

impl Default for ReceiptLimits {
    fn default() -> Self {
        ReceiptLimits {
            max_items: crate::MAX_RECEIPT_ITEMS,
            max_item_quantity: crate::MAX_ITEM_QUANTITY,
            max_claimants_per_item: crate::MAX_CLAIMANTS_PER_ITEM,
            max_share_weight: crate::MAX_SHARE_WEIGHT,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_implied() {
        let rate = TaxRate::implied(Money::from_cents(300), Money::from_cents(3000));
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);

        let rate = TaxRate::implied(Money::from_cents(83), Money::from_cents(1000));
        assert_eq!(rate.bps(), 830);

        assert!(TaxRate::implied(Money::from_cents(300), Money::zero()).is_zero());
    }

    #[test]
    fn test_receipt_status_default() {
        assert_eq!(ReceiptStatus::default(), ReceiptStatus::Open);
        assert_eq!(ReceiptStatus::Finalized.to_string(), "finalized");
    }

    #[test]
    fn test_item_record_defaults() {
        let item: Item =
            serde_json::from_str(r#"{"id":"a","name":"Fries","total_price":"4.50"}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.available);
        assert_eq!(item.total_price.cents(), 450);
    }

    #[test]
    fn test_claim_record_defaults() {
        let claim: Claim = serde_json::from_str(
            r#"{"item_id":"a","user_id":"alice","claimed_quantity":2}"#,
        )
        .unwrap();
        assert!(!claim.id.is_empty());
        assert_eq!(claim.claimed_quantity, 2);
    }

    #[test]
    fn test_receipt_totals_new() {
        let totals = ReceiptTotals::new(
            Money::from_cents(3000),
            Money::from_cents(300),
            Money::from_cents(500),
        );
        assert_eq!(totals.total.cents(), 3800);

        let huge = Money::from_cents(i64::MAX / 2 + 1);
        let saturated = ReceiptTotals::new(huge, huge, Money::zero());
        assert_eq!(saturated.total.cents(), i64::MAX);
    }

    #[test]
    fn test_limits_without_share_weight_use_default() {
        let limits: ReceiptLimits = serde_json::from_str(
            r#"{"max_items":10,"max_item_quantity":5,"max_claimants_per_item":3}"#,
        )
        .unwrap();
        assert_eq!(limits.max_share_weight, crate::MAX_SHARE_WEIGHT);
    }

    #[test]
    fn test_receipt_totals_accepts_recorded_field_names() {
        let totals: ReceiptTotals = serde_json::from_str(
            r#"{"subtotal":"30.00","tax_total":"3.00","tip_total":5,"total":"38.00"}"#,
        )
        .unwrap();
        assert_eq!(totals.tax.cents(), 300);
        assert_eq!(totals.tip.cents(), 500);
        assert_eq!(totals.total.cents(), 3800);
    }

    #[test]
    fn test_finalized_share_serializes_as_decimal_strings() {
        let share = FinalizedShare {
            subtotal: Money::from_cents(1000),
            tax: Money::from_cents(100),
            tip: Money::from_cents(250),
            total: Money::from_cents(1350),
        };
        let json = serde_json::to_value(share).unwrap();
        assert_eq!(json["total"], "13.50");
        assert_eq!(json["tip"], "2.50");
    }
}
