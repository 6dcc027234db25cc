//! # Share Allocator
//!
//! Turns one item's claims into per-user cents.
//!
//! ```text
//! item.total_price = $10.00, claims: alice 1, bob 2   (totalShares = 3)
//!
//!   alice: floor(1000 × 1 / 3) = 333
//!   bob:   floor(1000 × 2 / 3) = 666
//!   truncated: 1000 - 999      =   1
//! ```
//!
//! Flooring happens here, once per (item, user). Tax, tip and remainder
//! cents are the finalizer's job.

use tracing::warn;

use crate::money::Money;
use crate::types::{Claim, Item};

/// One claimant's floored slice of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation<'a> {
    pub user_id: &'a str,
    pub weight: i64,
    pub amount: Money,
}

/// The split of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAllocation<'a> {
    pub item_id: &'a str,
    /// Σ weight over contributing claims.
    pub total_shares: i64,
    /// One entry per contributing claim, in claim order.
    pub allocations: Vec<Allocation<'a>>,
    /// Price not assigned to anyone: the whole price when unclaimed,
    /// otherwise the floor-division leftover.
    pub unassigned: Money,
}

impl ItemAllocation<'_> {
    /// Whether nobody contributes to this item.
    pub fn is_unclaimed(&self) -> bool {
        self.allocations.is_empty()
    }
}

/// Allocates `item.total_price` across `claims` in proportion to their
/// weights.
///
/// Claims with non-positive weight and items whose total shares are
/// non-positive or overflow `i64` contribute nothing. Those states can't
/// come out of the ledger, so they are logged as warnings.
pub fn allocate<'a, I>(item: &'a Item, claims: I) -> ItemAllocation<'a>
where
    I: IntoIterator<Item = &'a Claim>,
{
    let price = item.total_price.non_negative();
    let contributing: Vec<&Claim> = claims
        .into_iter()
        .filter(|claim| {
            if claim.claimed_quantity <= 0 {
                warn!(
                    item_id = %item.id,
                    user_id = %claim.user_id,
                    weight = claim.claimed_quantity,
                    "Ignoring claim with non-positive weight"
                );
                return false;
            }
            true
        })
        .collect();

    let total_shares = contributing
        .iter()
        .try_fold(0i64, |acc, c| acc.checked_add(c.claimed_quantity));
    let total_shares = match total_shares {
        Some(total) if total > 0 => total,
        overflowed => {
            if overflowed.is_none() {
                warn!(item_id = %item.id, "Total shares overflowed; item contributes nothing");
            }
            return ItemAllocation {
                item_id: &item.id,
                total_shares: 0,
                allocations: Vec::new(),
                unassigned: price,
            };
        }
    };

    let allocations: Vec<Allocation<'a>> = contributing
        .into_iter()
        .map(|claim| Allocation {
            user_id: &claim.user_id,
            weight: claim.claimed_quantity,
            amount: price.mul_div_floor(claim.claimed_quantity, total_shares),
        })
        .collect();

    let assigned: Money = allocations.iter().map(|a| a.amount).sum();
    ItemAllocation {
        item_id: &item.id,
        total_shares,
        allocations,
        unassigned: price - assigned,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cents: i64) -> Item {
        Item::new("pizza", "Pizza", 1, Money::from_cents(cents))
    }

    #[test]
    fn test_even_split() {
        let item = item(2000);
        let claims = vec![Claim::new("pizza", "u1", 1), Claim::new("pizza", "u2", 1)];
        let result = allocate(&item, &claims);

        assert_eq!(result.total_shares, 2);
        assert_eq!(result.allocations[0].amount.cents(), 1000);
        assert_eq!(result.allocations[1].amount.cents(), 1000);
        assert!(result.unassigned.is_zero());
    }

    #[test]
    fn test_weighted_split_floors() {
        let item = item(1000);
        let claims = vec![Claim::new("pizza", "alice", 1), Claim::new("pizza", "bob", 2)];
        let result = allocate(&item, &claims);

        assert_eq!(result.allocations[0].amount.cents(), 333);
        assert_eq!(result.allocations[1].amount.cents(), 666);
        assert_eq!(result.unassigned.cents(), 1);
    }

    #[test]
    fn test_unclaimed_item() {
        let item = item(750);
        let result = allocate(&item, std::iter::empty());

        assert!(result.is_unclaimed());
        assert_eq!(result.total_shares, 0);
        assert_eq!(result.unassigned.cents(), 750);
    }

    #[test]
    fn test_non_positive_weights_contribute_nothing() {
        let item = item(900);
        let mut bad = Claim::new("pizza", "mallory", 1);
        bad.claimed_quantity = 0;
        let claims = vec![bad, Claim::new("pizza", "alice", 2)];
        let result = allocate(&item, &claims);

        assert_eq!(result.allocations.len(), 1);
        assert_eq!(result.allocations[0].user_id, "alice");
        assert_eq!(result.allocations[0].amount.cents(), 900);

        let mut only_bad = Claim::new("pizza", "mallory", 1);
        only_bad.claimed_quantity = -4;
        let result = allocate(&item, std::slice::from_ref(&only_bad));
        assert!(result.is_unclaimed());
        assert_eq!(result.unassigned.cents(), 900);
    }

    #[test]
    fn test_overflowing_shares_contribute_nothing() {
        let item = item(2000);
        let claims = vec![
            Claim::new("pizza", "alice", i64::MAX),
            Claim::new("pizza", "bob", 1),
        ];
        let result = allocate(&item, &claims);

        assert!(result.is_unclaimed());
        assert_eq!(result.total_shares, 0);
        assert_eq!(result.unassigned.cents(), 2000);
    }

    #[test]
    fn test_unit_claims_are_weights() {
        // 3 units at $9.00: alice 1 unit, bob 2 units
        let item = Item::new("beer", "Beer", 3, Money::from_cents(900));
        let claims = vec![Claim::new("beer", "alice", 1), Claim::new("beer", "bob", 2)];
        let result = allocate(&item, &claims);

        assert_eq!(result.allocations[0].amount.cents(), 300);
        assert_eq!(result.allocations[1].amount.cents(), 600);
    }
}
