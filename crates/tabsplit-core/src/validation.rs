//! # Validation Module
//!
//! Input validation for records crossing into the core.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API)                                            │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Item records: id, name, quantity, price                           │
//! │  └── Receipt totals: non-negative subtotal, tax, tip                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Claim Ledger                                                 │
//! │  └── Quantity / capacity / split rules (CoreError)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Item, ReceiptLimits, ReceiptTotals};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted item or user identifier.
pub const MAX_ID_LEN: usize = 128;

/// Longest accepted item name.
pub const MAX_NAME_LEN: usize = 200;

/// Largest accepted single amount: $10,000,000,000.00.
///
/// Together with [`MAX_ITEMS_CEILING`] this keeps every subtotal, tax and
/// tip sum far inside `i64` cents.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Highest `max_items` a receipt may be configured with.
pub const MAX_ITEMS_CEILING: usize = 100_000;

/// Highest `max_item_quantity` a receipt may be configured with.
pub const MAX_ITEM_QUANTITY_CEILING: i64 = 1_000_000;

/// Highest `max_claimants_per_item` a receipt may be configured with.
pub const MAX_CLAIMANTS_CEILING: usize = 10_000;

/// Highest `max_share_weight` a receipt may be configured with.
pub const MAX_SHARE_WEIGHT_CEILING: i64 = 1_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an identifier (item id, user id, receipt id).
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 128 characters
///
/// ## Example
/// ```rust
/// use tabsplit_core::validation::validate_id;
///
/// assert!(validate_id("user_id", "alice").is_ok());
/// assert!(validate_id("user_id", "  ").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item's unit count.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed `max`
///
/// ## Example
/// ```rust
/// use tabsplit_core::validation::validate_item_quantity;
///
/// assert!(validate_item_quantity(1, 999).is_ok());
/// assert!(validate_item_quantity(0, 999).is_err());
/// assert!(validate_item_quantity(1000, 999).is_err());
/// ```
pub fn validate_item_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a monetary amount.
///
/// ## Rules
/// - Must not be negative. Zero is allowed (free items, no tip)
/// - At most [`MAX_AMOUNT_CENTS`]
///
/// ## Example
/// ```rust
/// use tabsplit_core::money::Money;
/// use tabsplit_core::validation::validate_amount;
///
/// assert!(validate_amount("total_price", Money::from_cents(0)).is_ok());
/// assert!(validate_amount("total_price", Money::from_cents(-1)).is_err());
/// assert!(validate_amount("total_price", Money::from_cents(i64::MAX)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a full item record against the receipt limits.
pub fn validate_item(item: &Item, limits: &ReceiptLimits) -> ValidationResult<()> {
    validate_id("item_id", &item.id)?;
    validate_item_name(&item.name)?;
    validate_item_quantity(item.quantity, limits.max_item_quantity)?;
    validate_amount("total_price", item.total_price)?;
    Ok(())
}

/// Validates the monetary fields recorded on a receipt.
///
/// `total` is informational and only has to be non-negative.
pub fn validate_totals(totals: &ReceiptTotals) -> ValidationResult<()> {
    validate_amount("subtotal", totals.subtotal)?;
    validate_amount("tax_total", totals.tax)?;
    validate_amount("tip_total", totals.tip)?;
    if totals.total.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "total".to_string(),
        });
    }
    Ok(())
}

/// Validates receipt limits.
///
/// Every limit must be at least 1 and at most its ceiling, so the sums the
/// finalizer takes over items, prices and weights can't overflow.
pub fn validate_limits(limits: &ReceiptLimits) -> ValidationResult<()> {
    fn in_range(field: &str, value: i64, max: i64) -> ValidationResult<()> {
        if value < 1 || value > max {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 1,
                max,
            });
        }
        Ok(())
    }

    in_range(
        "max_items",
        i64::try_from(limits.max_items).unwrap_or(i64::MAX),
        MAX_ITEMS_CEILING as i64,
    )?;
    in_range(
        "max_item_quantity",
        limits.max_item_quantity,
        MAX_ITEM_QUANTITY_CEILING,
    )?;
    in_range(
        "max_claimants_per_item",
        i64::try_from(limits.max_claimants_per_item).unwrap_or(i64::MAX),
        MAX_CLAIMANTS_CEILING as i64,
    )?;
    in_range(
        "max_share_weight",
        limits.max_share_weight,
        MAX_SHARE_WEIGHT_CEILING,
    )?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("item_id", "a").is_ok());
        assert!(validate_id("item_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("item_id", "").is_err());
        assert!(validate_id("item_id", &"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Margherita Pizza").is_ok());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_item_quantity() {
        assert!(validate_item_quantity(1, 999).is_ok());
        assert!(validate_item_quantity(999, 999).is_ok());
        assert!(validate_item_quantity(0, 999).is_err());
        assert!(validate_item_quantity(-1, 999).is_err());
        assert!(validate_item_quantity(1000, 999).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_item() {
        let limits = ReceiptLimits::default();
        let item = Item::new("a", "Fries", 2, Money::from_cents(450));
        assert!(validate_item(&item, &limits).is_ok());

        let negative = Item::new("a", "Fries", 2, Money::from_cents(-1));
        assert!(matches!(
            validate_item(&negative, &limits),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        let nameless = Item::new("a", "", 2, Money::from_cents(1));
        assert!(matches!(
            validate_item(&nameless, &limits),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_totals() {
        let ok = ReceiptTotals::new(Money::from_cents(100), Money::zero(), Money::zero());
        assert!(validate_totals(&ok).is_ok());

        let bad_tip = ReceiptTotals::new(
            Money::from_cents(100),
            Money::zero(),
            Money::from_cents(-5),
        );
        assert!(validate_totals(&bad_tip).is_err());

        let huge_tax = ReceiptTotals::new(
            Money::from_cents(100),
            Money::from_cents(MAX_AMOUNT_CENTS + 1),
            Money::zero(),
        );
        assert!(matches!(
            validate_totals(&huge_tax),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_amount_upper_bound() {
        assert!(validate_amount("total_price", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
        assert!(matches!(
            validate_amount("total_price", Money::from_cents(MAX_AMOUNT_CENTS + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_amount("total_price", Money::from_cents(i64::MAX / 2 + 1)).is_err());
    }

    #[test]
    fn test_validate_limits() {
        assert!(validate_limits(&ReceiptLimits::default()).is_ok());

        let mut limits = ReceiptLimits::default();
        limits.max_items = 0;
        assert!(validate_limits(&limits).is_err());

        let mut limits = ReceiptLimits::default();
        limits.max_items = usize::MAX;
        assert!(validate_limits(&limits).is_err());

        let mut limits = ReceiptLimits::default();
        limits.max_share_weight = i64::MAX;
        assert!(validate_limits(&limits).is_err());

        let mut limits = ReceiptLimits::default();
        limits.max_claimants_per_item = MAX_CLAIMANTS_CEILING + 1;
        assert!(validate_limits(&limits).is_err());
    }

    /// The worst accepted receipt still sums inside i64.
    #[test]
    fn test_ceilings_keep_sums_in_range() {
        let worst_subtotal = MAX_ITEMS_CEILING as i128 * MAX_AMOUNT_CENTS as i128;
        assert!(worst_subtotal + 2 * MAX_AMOUNT_CENTS as i128 <= i64::MAX as i128);

        let worst_shares = MAX_CLAIMANTS_CEILING as i128 * MAX_SHARE_WEIGHT_CEILING as i128;
        assert!(worst_shares <= i64::MAX as i128);
    }
}
