//! # Claim Ledger
//!
//! Owns every claim on one receipt and enforces the per-item rules.
//!
//! ## Invariants
//! - At most one claim per (item, user). Writes replace, never accumulate.
//! - For unit-claimed items, `Σ claimed_quantity <= item.quantity`.
//! - Split items hold relative weights instead of units; their sum is
//!   unconstrained.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller Action            Ledger Operation        State Change          │
//! │  ─────────────            ────────────────        ────────────          │
//! │                                                                         │
//! │  Stepper +/- ───────────► set_claim() ──────────► claims[item][user]=q  │
//! │                                                                         │
//! │  "Not mine" ────────────► remove_claim() ───────► claims[item] -= user  │
//! │                                                                         │
//! │  "Split N ways" ────────► set_split() ──────────► claims[item] = map    │
//! │                                                                         │
//! │  NOTE: mutations are crate-private. Callers go through `Receipt`,       │
//! │        which checks the lifecycle status first.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::{Claim, Item};
use crate::validation::validate_id;

/// Claims for a single receipt, keyed by item id then user id.
#[derive(Debug, Clone)]
pub struct ClaimLedger {
    claims: BTreeMap<String, BTreeMap<String, Claim>>,
    split_items: BTreeSet<String>,
    max_claimants_per_item: usize,
    max_share_weight: i64,
}

impl ClaimLedger {
    /// Creates an empty ledger.
    pub fn new(max_claimants_per_item: usize, max_share_weight: i64) -> Self {
        ClaimLedger {
            claims: BTreeMap::new(),
            split_items: BTreeSet::new(),
            max_claimants_per_item,
            max_share_weight,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Sets `user_id`'s claim on `item` to exactly `quantity`.
    ///
    /// ## Capacity Check
    /// ```text
    /// remaining = item.quantity - Σ(other users' claims)
    /// quantity > remaining  →  OverAllocation
    /// ```
    /// The user's own previous claim doesn't count against them: going from
    /// 2 to 3 on a 3-unit item with no other claimants succeeds.
    ///
    /// Returns the item's claims after the write.
    pub(crate) fn set_claim(
        &mut self,
        item: &Item,
        user_id: &str,
        quantity: i64,
    ) -> CoreResult<Vec<Claim>> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity { quantity });
        }
        validate_id("user_id", user_id)?;
        if !item.available {
            return Err(CoreError::ItemUnavailable(item.id.clone()));
        }

        let others = self.total_claimed(&item.id) - self.user_claimed(&item.id, user_id);
        let remaining = (item.quantity - others).max(0);
        if quantity > remaining {
            return Err(CoreError::OverAllocation {
                item_id: item.id.clone(),
                requested: quantity,
                remaining,
            });
        }

        let item_claims = self.claims.entry(item.id.clone()).or_default();
        match item_claims.get_mut(user_id) {
            Some(existing) => {
                existing.claimed_quantity = quantity;
                existing.updated_at = Utc::now();
            }
            None => {
                if item_claims.len() >= self.max_claimants_per_item {
                    return Err(CoreError::TooManyClaimants {
                        item_id: item.id.clone(),
                        max: self.max_claimants_per_item,
                    });
                }
                item_claims.insert(
                    user_id.to_string(),
                    Claim::new(item.id.clone(), user_id, quantity),
                );
            }
        }

        // Capacity now holds, so the item is back to plain unit claims.
        self.split_items.remove(&item.id);

        debug!(item_id = %item.id, user_id, quantity, remaining, "Claim set");
        Ok(self.claims_for(&item.id))
    }

    /// Deletes `user_id`'s claim on the item. Absent claims are a no-op.
    ///
    /// Returns whether a claim was removed.
    pub(crate) fn remove_claim(&mut self, item_id: &str, user_id: &str) -> bool {
        let Some(item_claims) = self.claims.get_mut(item_id) else {
            return false;
        };
        let removed = item_claims.remove(user_id).is_some();
        if item_claims.is_empty() {
            self.claims.remove(item_id);
            self.split_items.remove(item_id);
        }
        if removed {
            debug!(item_id, user_id, "Claim removed");
        }
        removed
    }

    /// Replaces every claim on `item` with `shares` (user → weight).
    ///
    /// Zero-weight entries are dropped. Weights are relative: `{a: 1, b: 2}`
    /// on a $9 item bills $3 and $6 regardless of the item's quantity.
    /// Negative weights and weights above `max_share_weight` fail with
    /// `InvalidQuantity`.
    pub(crate) fn set_split(
        &mut self,
        item: &Item,
        shares: &BTreeMap<String, i64>,
    ) -> CoreResult<Vec<Claim>> {
        if let Some(weight) = shares
            .values()
            .copied()
            .find(|w| *w < 0 || *w > self.max_share_weight)
        {
            return Err(CoreError::InvalidQuantity { quantity: weight });
        }
        let positive: BTreeMap<&String, i64> = shares
            .iter()
            .filter(|entry| *entry.1 > 0)
            .map(|(user, weight)| (user, *weight))
            .collect();
        if positive.is_empty() {
            return Err(CoreError::EmptySplit {
                item_id: item.id.clone(),
            });
        }
        for user in positive.keys() {
            validate_id("user_id", user)?;
        }
        if !item.available {
            return Err(CoreError::ItemUnavailable(item.id.clone()));
        }
        if positive.len() > self.max_claimants_per_item {
            return Err(CoreError::TooManyClaimants {
                item_id: item.id.clone(),
                max: self.max_claimants_per_item,
            });
        }

        let replacement = positive
            .into_iter()
            .map(|(user, weight)| (user.clone(), Claim::new(item.id.clone(), user.clone(), weight)))
            .collect::<BTreeMap<_, _>>();

        debug!(item_id = %item.id, claimants = replacement.len(), "Split applied");
        self.claims.insert(item.id.clone(), replacement);
        self.split_items.insert(item.id.clone());
        Ok(self.claims_for(&item.id))
    }

    /// Loads a stored claim record without the capacity check.
    ///
    /// Used when rebuilding a ledger from persisted records, which may
    /// include split weights. An item whose restored weights exceed its
    /// quantity is treated as split; [`ClaimLedger::mark_split`] covers
    /// splits that fit inside the quantity.
    pub(crate) fn restore(&mut self, item: &Item, claim: Claim) -> CoreResult<()> {
        let max = self.max_share_weight.max(item.quantity);
        if claim.claimed_quantity <= 0 || claim.claimed_quantity > max {
            return Err(CoreError::InvalidQuantity {
                quantity: claim.claimed_quantity,
            });
        }
        validate_id("user_id", &claim.user_id)?;

        self.claims
            .entry(item.id.clone())
            .or_default()
            .insert(claim.user_id.clone(), claim);
        if self.total_claimed(&item.id) > item.quantity {
            self.split_items.insert(item.id.clone());
        }
        Ok(())
    }

    /// Flags a restored item as split. No-op for items without claims.
    pub(crate) fn mark_split(&mut self, item_id: &str) {
        if self.claims.contains_key(item_id) {
            self.split_items.insert(item_id.to_string());
        }
    }

    /// Checks that `item` can shrink to `new_quantity` units.
    ///
    /// Split items always can; unit-claimed items can't drop below what is
    /// already claimed.
    pub(crate) fn check_quantity_change(&self, item: &Item, new_quantity: i64) -> CoreResult<()> {
        if self.is_split(&item.id) {
            return Ok(());
        }
        let claimed = self.total_claimed(&item.id);
        if claimed > new_quantity {
            return Err(CoreError::OverAllocation {
                item_id: item.id.clone(),
                requested: claimed,
                remaining: new_quantity,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Σ claimed_quantity across every claim on the item.
    ///
    /// Saturates at `i64::MAX`; the weight limit keeps real sums far below.
    pub fn total_claimed(&self, item_id: &str) -> i64 {
        let Some(item_claims) = self.claims.get(item_id) else {
            return 0;
        };
        item_claims
            .values()
            .try_fold(0i64, |acc, claim| acc.checked_add(claim.claimed_quantity))
            .unwrap_or_else(|| {
                warn!(item_id, "Claimed quantity overflowed; saturating");
                i64::MAX
            })
    }

    /// The user's claimed quantity on the item (0 if none).
    pub fn user_claimed(&self, item_id: &str, user_id: &str) -> i64 {
        self.claims
            .get(item_id)
            .and_then(|c| c.get(user_id))
            .map(|claim| claim.claimed_quantity)
            .unwrap_or(0)
    }

    /// Units still claimable on the item; 0 for unavailable items.
    pub fn remaining(&self, item: &Item) -> i64 {
        if !item.available {
            return 0;
        }
        (item.quantity - self.total_claimed(&item.id)).max(0)
    }

    /// Claims on the item, ordered by user id.
    pub fn claims_for(&self, item_id: &str) -> Vec<Claim> {
        self.iter_item(item_id).cloned().collect()
    }

    /// Borrowing iterator over the item's claims, ordered by user id.
    pub fn iter_item<'a>(&'a self, item_id: &str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.claims
            .get(item_id)
            .into_iter()
            .flat_map(|c| c.values())
    }

    /// Every claim on the receipt, ordered by item id then user id.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values().flat_map(|c| c.values())
    }

    /// Whether the item currently holds split weights.
    pub fn is_split(&self, item_id: &str) -> bool {
        self.split_items.contains(item_id)
    }

    /// Ids of items in split mode, ascending.
    pub fn split_items(&self) -> impl Iterator<Item = &str> {
        self.split_items.iter().map(String::as_str)
    }

    /// Total number of claim records.
    pub fn len(&self) -> usize {
        self.claims.values().map(BTreeMap::len).sum()
    }

    /// Whether no claims exist.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl Default for ClaimLedger {
    fn default() -> Self {
        ClaimLedger::new(crate::MAX_CLAIMANTS_PER_ITEM, crate::MAX_SHARE_WEIGHT)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
