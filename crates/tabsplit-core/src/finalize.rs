//! # Finalization Engine
//!
//! Produces the authoritative per-user split for a receipt.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items + claims + totals                                                │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Availability Filter ──► available items, adjusted tax, tip             │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Share Allocator (per item) ──► floor(price × w / Σw) per user          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  per-user subtotal (integer cents)                                      │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  tax_u = floor(tax × sub_u / Σsub)    tip_u = floor(tip × sub_u / Σsub) │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  leftover cents → users by ascending user_id, round-robin               │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  FinalizedSnapshot   (Σ total == Σsub + tax + tip, exactly)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything stays in cents from start to finish; decimals only appear
//! when the snapshot is serialized.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::allocator::allocate;
use crate::availability::filter_available;
use crate::error::{CoreError, CoreResult};
use crate::ledger::ClaimLedger;
use crate::money::Money;
use crate::types::{FinalizedShare, FinalizedSnapshot, Item, ReceiptTotals};

/// Computes the finalized split for `items` under `ledger`'s claims.
///
/// Pure and deterministic: identical input always yields an identical
/// snapshot. Inputs are expected to be within the validation bounds
/// `Receipt` enforces, which keep every cent sum inside `i64`.
///
/// ## Errors
/// - [`CoreError::NoItems`] when no item is available
/// - [`CoreError::NothingClaimed`] when nothing available is claimed but
///   there is tax or tip to hand out
pub fn finalize(
    items: &[Item],
    ledger: &ClaimLedger,
    totals: &ReceiptTotals,
) -> CoreResult<FinalizedSnapshot> {
    let available = filter_available(items, totals);
    if available.is_empty() {
        return Err(CoreError::NoItems);
    }

    // Step 1: per-user subtotals, floored per item contribution.
    let mut subtotals: BTreeMap<&str, Money> = BTreeMap::new();
    let mut unclaimed = Money::zero();
    let mut truncated = Money::zero();
    for item in &available.items {
        let allocation = allocate(item, ledger.iter_item(&item.id));
        if allocation.is_unclaimed() {
            unclaimed += allocation.unassigned;
            continue;
        }
        truncated += allocation.unassigned;
        for share in allocation.allocations {
            *subtotals.entry(share.user_id).or_default() += share.amount;
        }
    }

    let allocated_subtotal: Money = subtotals.values().sum();
    let tax = available.adjusted_tax;
    let tip = available.tip;

    if allocated_subtotal.is_zero() && (tax.is_positive() || tip.is_positive()) {
        return Err(CoreError::NothingClaimed);
    }

    // Steps 2-4: proportional tax and tip, then remainder cents.
    let tax_shares = distribute(tax, &subtotals);
    let tip_shares = distribute(tip, &subtotals);

    // Step 5: assemble.
    let shares: BTreeMap<String, FinalizedShare> = subtotals
        .iter()
        .map(|(&user_id, &subtotal)| {
            let tax = tax_shares.get(user_id).copied().unwrap_or_default();
            let tip = tip_shares.get(user_id).copied().unwrap_or_default();
            let share = FinalizedShare {
                subtotal,
                tax,
                tip,
                total: subtotal + tax + tip,
            };
            (user_id.to_string(), share)
        })
        .collect();

    let grand_total: Money = shares.values().map(|s| s.total).sum();
    debug_assert_eq!(grand_total, allocated_subtotal + tax + tip);

    info!(
        users = shares.len(),
        available_subtotal = %available.subtotal,
        adjusted_tax = %tax,
        tip = %tip,
        grand_total = %grand_total,
        unclaimed = %unclaimed,
        truncated = %truncated,
        "Receipt split computed"
    );

    Ok(FinalizedSnapshot {
        shares,
        available_subtotal: available.subtotal,
        allocated_subtotal,
        adjusted_tax: tax,
        tip,
        grand_total,
        unclaimed,
        truncated,
    })
}

/// Splits `amount` across `weights` proportionally, exactly.
///
/// Each key first gets `floor(amount × weight / Σweight)`. The cents lost
/// to flooring then go out one at a time to keys with a nonzero weight in
/// ascending key order, wrapping around until none are left. Keys with zero
/// weight get zero.
///
/// The returned values always sum to `amount` when `Σweight > 0` and
/// `amount >= 0`.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use tabsplit_core::finalize::distribute;
/// use tabsplit_core::money::Money;
///
/// let weights = BTreeMap::from([
///     ("alice", Money::from_cents(1)),
///     ("bob", Money::from_cents(1)),
///     ("carol", Money::from_cents(1)),
/// ]);
/// let split = distribute(Money::from_cents(100), &weights);
/// assert_eq!(split["alice"].cents(), 34); // first in line for the leftover
/// assert_eq!(split["bob"].cents(), 33);
/// assert_eq!(split["carol"].cents(), 33);
/// ```
pub fn distribute<'a>(amount: Money, weights: &BTreeMap<&'a str, Money>) -> BTreeMap<&'a str, Money> {
    let amount = amount.non_negative();
    let total: Money = weights.values().map(Money::non_negative).sum();

    let mut result: BTreeMap<&'a str, Money> = weights
        .iter()
        .map(|(&key, weight)| {
            let weight = weight.non_negative();
            (key, amount.mul_div_floor(weight.cents(), total.cents()))
        })
        .collect();

    let eligible: Vec<&'a str> = weights
        .iter()
        .filter(|(_, weight)| weight.is_positive())
        .map(|(&key, _)| key)
        .collect();
    if eligible.is_empty() {
        return result;
    }

    let allocated: Money = result.values().sum();
    let remainder = (amount - allocated).cents();
    if remainder > 0 {
        debug!(remainder, recipients = eligible.len(), "Distributing remainder cents");
    }
    for (key, _) in eligible.iter().cycle().zip(0..remainder) {
        if let Some(slot) = result.get_mut(key) {
            *slot += Money::from_cents(1);
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Claim;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn ledger_with(items: &[Item], claims: &[(&str, &str, i64)]) -> ClaimLedger {
        let mut ledger = ClaimLedger::default();
        for (item_id, user, weight) in claims {
            let item = items.iter().find(|i| i.id == *item_id).unwrap();
            ledger.restore(item, Claim::new(*item_id, *user, *weight)).unwrap();
        }
        ledger
    }

    #[test]
    fn test_worked_example() {
        let items = vec![
            Item::new("a", "Item A", 1, cents(2000)),
            Item::new("b", "Item B", 1, cents(1000)).with_available(false),
        ];
        let ledger = ledger_with(&items, &[("a", "user1", 1), ("a", "user2", 1)]);
        let totals = ReceiptTotals::new(cents(3000), cents(300), cents(500));

        let snapshot = finalize(&items, &ledger, &totals).unwrap();

        assert_eq!(snapshot.available_subtotal.cents(), 2000);
        assert_eq!(snapshot.adjusted_tax.cents(), 200);
        assert_eq!(snapshot.tip.cents(), 500);
        for user in ["user1", "user2"] {
            let share = snapshot.share(user).unwrap();
            assert_eq!(share.subtotal.cents(), 1000);
            assert_eq!(share.tax.cents(), 100);
            assert_eq!(share.tip.cents(), 250);
            assert_eq!(share.total.cents(), 1350);
        }
        assert_eq!(snapshot.grand_total.cents(), 2700);
    }

    #[test]
    fn test_remainder_goes_to_smallest_user_id_first() {
        let items = vec![Item::new("p", "Pizza", 1, cents(1000))];
        let ledger = ledger_with(&items, &[("p", "carol", 1), ("p", "alice", 1), ("p", "bob", 1)]);
        let totals = ReceiptTotals::new(cents(1000), cents(100), cents(200));

        let snapshot = finalize(&items, &ledger, &totals).unwrap();

        // Each subtotal floors to 333; one cent of the pizza is truncated.
        assert_eq!(snapshot.truncated.cents(), 1);
        assert_eq!(snapshot.allocated_subtotal.cents(), 999);
        // Tax: floor(100 × 333 / 999) = 33 each, 1 leftover → alice.
        assert_eq!(snapshot.shares["alice"].tax.cents(), 34);
        assert_eq!(snapshot.shares["bob"].tax.cents(), 33);
        assert_eq!(snapshot.shares["carol"].tax.cents(), 33);
        // Tip: floor(200 × 333 / 999) = 66 each, 2 leftover → alice, bob.
        assert_eq!(snapshot.shares["alice"].tip.cents(), 67);
        assert_eq!(snapshot.shares["bob"].tip.cents(), 67);
        assert_eq!(snapshot.shares["carol"].tip.cents(), 66);

        assert_eq!(snapshot.grand_total.cents(), 999 + 100 + 200);
    }

    #[test]
    fn test_proportional_tax_and_tip() {
        let items = vec![Item::new("p", "Platter", 1, cents(3000))];
        let ledger = ledger_with(&items, &[("p", "u1", 1), ("p", "u2", 2)]);
        let totals = ReceiptTotals::new(cents(3000), cents(301), cents(599));

        let snapshot = finalize(&items, &ledger, &totals).unwrap();
        let u1 = snapshot.shares["u1"];
        let u2 = snapshot.shares["u2"];

        assert_eq!(u1.subtotal.cents() * 2, u2.subtotal.cents());
        assert!((u1.tax.cents() * 2 - u2.tax.cents()).abs() <= 2);
        assert!((u1.tip.cents() * 2 - u2.tip.cents()).abs() <= 2);
        assert_eq!(u1.tax.cents() + u2.tax.cents(), 301);
        assert_eq!(u1.tip.cents() + u2.tip.cents(), 599);
    }

    #[test]
    fn test_unclaimed_items_reported_not_billed() {
        let items = vec![
            Item::new("a", "Salad", 1, cents(1200)),
            Item::new("b", "Soup", 1, cents(800)),
        ];
        let ledger = ledger_with(&items, &[("a", "alice", 1)]);
        let totals = ReceiptTotals::new(cents(2000), cents(200), cents(0));

        let snapshot = finalize(&items, &ledger, &totals).unwrap();

        assert_eq!(snapshot.unclaimed.cents(), 800);
        assert_eq!(snapshot.shares.len(), 1);
        // Tax was derived from the full available subtotal and all of it
        // lands on the only claimant.
        assert_eq!(snapshot.shares["alice"].tax.cents(), 200);
        assert_eq!(snapshot.shares["alice"].total.cents(), 1400);
    }

    #[test]
    fn test_no_available_items() {
        let items = vec![Item::new("a", "Salad", 1, cents(1200)).with_available(false)];
        let ledger = ClaimLedger::default();
        let totals = ReceiptTotals::new(cents(1200), cents(100), cents(0));

        assert!(matches!(
            finalize(&items, &ledger, &totals),
            Err(CoreError::NoItems)
        ));
        assert!(matches!(
            finalize(&[], &ledger, &totals),
            Err(CoreError::NoItems)
        ));
    }

    #[test]
    fn test_nothing_claimed() {
        let items = vec![Item::new("a", "Salad", 1, cents(1200))];
        let ledger = ClaimLedger::default();

        let with_tax = ReceiptTotals::new(cents(1200), cents(100), cents(0));
        assert!(matches!(
            finalize(&items, &ledger, &with_tax),
            Err(CoreError::NothingClaimed)
        ));

        let bare = ReceiptTotals::new(cents(1200), cents(0), cents(0));
        let snapshot = finalize(&items, &ledger, &bare).unwrap();
        assert!(snapshot.shares.is_empty());
        assert_eq!(snapshot.unclaimed.cents(), 1200);
        assert!(snapshot.grand_total.is_zero());
    }

    #[test]
    fn test_zero_subtotal_user_gets_no_remainder() {
        let items = vec![
            Item::new("free", "Water", 1, cents(0)),
            Item::new("a", "Steak", 1, cents(999)),
        ];
        let ledger = ledger_with(&items, &[("free", "aaron", 1), ("a", "zed", 1)]);
        let totals = ReceiptTotals::new(cents(999), cents(77), cents(10));

        let snapshot = finalize(&items, &ledger, &totals).unwrap();
        let aaron = snapshot.shares["aaron"];
        assert!(aaron.total.is_zero());
        assert_eq!(snapshot.shares["zed"].total.cents(), 999 + 77 + 10);
    }

    #[test]
    fn test_finalize_is_deterministic() {
        let items = vec![
            Item::new("a", "A", 2, cents(1999)),
            Item::new("b", "B", 1, cents(457)),
        ];
        let ledger = ledger_with(&items, &[("a", "x", 1), ("a", "y", 1), ("b", "y", 3), ("b", "z", 4)]);
        let totals = ReceiptTotals::new(cents(2456), cents(203), cents(411));

        let first = finalize(&items, &ledger, &totals).unwrap();
        let second = finalize(&items, &ledger, &totals).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distribute_zero_weights() {
        let weights = BTreeMap::from([("a", cents(0)), ("b", cents(0))]);
        let split = distribute(cents(50), &weights);
        assert!(split.values().all(|m| m.is_zero()));
    }

    #[test]
    fn test_distribute_skips_zero_weight_keys_for_remainder() {
        let weights = BTreeMap::from([("a", cents(0)), ("b", cents(1)), ("c", cents(1))]);
        let split = distribute(cents(3), &weights);
        assert_eq!(split["a"].cents(), 0);
        assert_eq!(split["b"].cents(), 2);
        assert_eq!(split["c"].cents(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const USERS: [&str; 4] = ["ana", "ben", "cy", "dee"];

        #[derive(Debug, Clone)]
        struct Scenario {
            items: Vec<Item>,
            claims: Vec<(usize, usize, i64)>,
            totals: ReceiptTotals,
        }

        fn scenario() -> impl Strategy<Value = Scenario> {
            let item = (0i64..50_000, 1i64..5, prop::bool::weighted(0.8));
            (
                prop::collection::vec(item, 1..8),
                prop::collection::vec((0usize..8, 0usize..4, 1i64..6), 0..20),
                0i64..100_000,
                0i64..10_000,
                0i64..10_000,
            )
                .prop_map(|(raw_items, claims, subtotal, tax, tip)| {
                    let items = raw_items
                        .into_iter()
                        .enumerate()
                        .map(|(i, (price, qty, available))| {
                            Item::new(format!("item-{i}"), "Item", qty, cents(price))
                                .with_available(available)
                        })
                        .collect();
                    Scenario {
                        items,
                        claims,
                        totals: ReceiptTotals::new(cents(subtotal), cents(tax), cents(tip)),
                    }
                })
        }

        fn build_ledger(s: &Scenario) -> ClaimLedger {
            let mut ledger = ClaimLedger::default();
            for &(item_idx, user_idx, weight) in &s.claims {
                if let Some(item) = s.items.get(item_idx) {
                    ledger
                        .restore(item, Claim::new(item.id.clone(), USERS[user_idx], weight))
                        .unwrap();
                }
            }
            ledger
        }

        proptest! {
            /// Property: no cent is created or lost.
            #[test]
            fn prop_sum_preserved(s in scenario()) {
                let ledger = build_ledger(&s);
                if let Ok(snapshot) = finalize(&s.items, &ledger, &s.totals) {
                    let sum: Money = snapshot.shares.values().map(|sh| sh.total).sum();
                    prop_assert_eq!(
                        sum,
                        snapshot.allocated_subtotal + snapshot.adjusted_tax + snapshot.tip
                    );
                    prop_assert_eq!(sum, snapshot.grand_total);
                    prop_assert_eq!(
                        snapshot.allocated_subtotal + snapshot.unclaimed + snapshot.truncated,
                        snapshot.available_subtotal
                    );
                }
            }

            /// Property: no component of any share is negative.
            #[test]
            fn prop_no_negative_shares(s in scenario()) {
                let ledger = build_ledger(&s);
                if let Ok(snapshot) = finalize(&s.items, &ledger, &s.totals) {
                    for share in snapshot.shares.values() {
                        prop_assert!(!share.subtotal.is_negative());
                        prop_assert!(!share.tax.is_negative());
                        prop_assert!(!share.tip.is_negative());
                        prop_assert_eq!(share.total, share.subtotal + share.tax + share.tip);
                    }
                }
            }

            /// Property: same input, same snapshot.
            #[test]
            fn prop_deterministic(s in scenario()) {
                let ledger = build_ledger(&s);
                let first = finalize(&s.items, &ledger, &s.totals);
                let second = finalize(&s.items, &ledger, &s.totals);
                match (first, second) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(a), Err(b)) => prop_assert_eq!(a.code(), b.code()),
                    _ => prop_assert!(false, "finalize disagreed with itself"),
                }
            }

            /// Property: distribute always hands out exactly the amount.
            #[test]
            fn prop_distribute_exact(
                amount in 0i64..1_000_000,
                weights in prop::collection::vec(1i64..100_000, 1..10),
            ) {
                let keys: Vec<String> = (0..weights.len()).map(|i| format!("u{i:02}")).collect();
                let map: BTreeMap<&str, Money> = keys
                    .iter()
                    .zip(&weights)
                    .map(|(k, w)| (k.as_str(), cents(*w)))
                    .collect();
                let split = distribute(cents(amount), &map);
                let total: Money = split.values().sum();
                prop_assert_eq!(total.cents(), amount);
            }
        }
    }
}
