//! # Receipt Session
//!
//! Shares one [`Receipt`] between many concurrent users.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Serialization Points                             │
//! │                                                                         │
//! │  alice: + on Pizza ──► begin_claim(pizza, alice) ──► ClaimPermit        │
//! │  alice: + again    ──► begin_claim(pizza, alice) ──► ClaimInFlight      │
//! │                                   (until the first permit drops)        │
//! │                                                                         │
//! │  permit.set(2) ─────┐                                                   │
//! │  bob: set_claim ────┼──► Mutex<Receipt> ──► status check                │
//! │  carol: finalize ───┘                       capacity check + write      │
//! │                                             open → finalized swap       │
//! │                                                                         │
//! │  Lock order: receipt, then activity. The permit set is only ever        │
//! │  locked on its own.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every claim write and the finalize transition run under the same receipt
//! lock, so two users can't both take an item's last unit, a claim can't
//! land after finalization, and only one of two racing `finalize` calls
//! wins.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tabsplit_core::{
    Claim, ClaimLine, CoreResult, FinalizedSnapshot, Item, ItemUpdate, Money, Receipt,
    ReceiptDocument, ReceiptStatus, TaxRate,
};
use tracing::{debug, info};

use crate::activity::{ActivityAction, ActivityEntry, ActivityLog};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

type ClaimKey = (String, String);

pub struct ReceiptSession {
    receipt: Mutex<Receipt>,
    in_flight: Mutex<BTreeSet<ClaimKey>>,
    activity: Mutex<ActivityLog>,
}

impl ReceiptSession {
    pub fn new(receipt: Receipt, config: &SessionConfig) -> Self {
        ReceiptSession {
            receipt: Mutex::new(receipt),
            in_flight: Mutex::new(BTreeSet::new()),
            activity: Mutex::new(ActivityLog::new(&config.activity)),
        }
    }

    /// Loads a receipt document under the configured limits.
    pub fn from_document(document: ReceiptDocument, config: &SessionConfig) -> SessionResult<Self> {
        let receipt = Receipt::from_document(document, config.receipt_limits())?;
        Ok(ReceiptSession::new(receipt, config))
    }

    fn lock_receipt(&self) -> SessionResult<MutexGuard<'_, Receipt>> {
        self.receipt.lock().map_err(|_| SessionError::LockPoisoned)
    }

    fn record(&self, actor: &str, action: ActivityAction) {
        // A poisoned log only loses history, never receipt state.
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(actor, action);
    }

    /// Runs `op` on the receipt under the lock and logs `action` if it
    /// succeeds.
    fn mutate<T>(
        &self,
        actor: &str,
        op: impl FnOnce(&mut Receipt) -> CoreResult<T>,
        action: impl FnOnce(&T) -> ActivityAction,
    ) -> SessionResult<T> {
        let mut receipt = self.lock_receipt()?;
        let value = op(&mut *receipt)?;
        self.record(actor, action(&value));
        Ok(value)
    }

    /// Runs a read-only query against the receipt.
    pub fn read<T>(&self, query: impl FnOnce(&Receipt) -> T) -> SessionResult<T> {
        let receipt = self.lock_receipt()?;
        Ok(query(&*receipt))
    }

    // =========================================================================
    // Claims
    // =========================================================================

    /// Reserves the (item, user) pair for one claim mutation.
    ///
    /// Fails with `ClaimInFlight` while another permit for the same pair is
    /// alive. The reservation is released when the permit drops.
    pub fn begin_claim(&self, item_id: &str, user_id: &str) -> SessionResult<ClaimPermit<'_>> {
        let key = (item_id.to_string(), user_id.to_string());
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.clone()) {
            debug!(item_id, user_id, "Claim already in flight");
            return Err(SessionError::ClaimInFlight {
                item_id: key.0,
                user_id: key.1,
            });
        }
        Ok(ClaimPermit { session: self, key })
    }

    /// One-shot claim write: permit, write, release.
    pub fn set_claim(&self, item_id: &str, user_id: &str, quantity: i64) -> SessionResult<Vec<Claim>> {
        self.begin_claim(item_id, user_id)?.set(quantity)
    }

    /// One-shot claim removal: permit, remove, release.
    pub fn remove_claim(&self, item_id: &str, user_id: &str) -> SessionResult<bool> {
        self.begin_claim(item_id, user_id)?.remove()
    }

    /// Replaces every claim on the item with `shares`.
    pub fn set_split(
        &self,
        actor: &str,
        item_id: &str,
        shares: &BTreeMap<String, i64>,
    ) -> SessionResult<Vec<Claim>> {
        self.mutate(
            actor,
            |receipt| receipt.set_split(item_id, shares),
            |claims| ActivityAction::Split {
                item_id: item_id.to_string(),
                claimants: claims.len(),
            },
        )
    }

    // =========================================================================
    // Items and Totals
    // =========================================================================

    pub fn add_item(&self, actor: &str, item: Item) -> SessionResult<()> {
        let item_id = item.id.clone();
        self.mutate(
            actor,
            |receipt| receipt.add_item(item),
            |_| ActivityAction::ItemAdded { item_id },
        )
    }

    pub fn update_item(&self, actor: &str, item_id: &str, update: ItemUpdate) -> SessionResult<Item> {
        self.mutate(
            actor,
            |receipt| receipt.update_item(item_id, update).cloned(),
            |_| ActivityAction::ItemEdited {
                item_id: item_id.to_string(),
            },
        )
    }

    pub fn set_item_availability(&self, actor: &str, item_id: &str, available: bool) -> SessionResult<()> {
        self.mutate(
            actor,
            |receipt| receipt.set_item_availability(item_id, available),
            |_| ActivityAction::AvailabilityChanged {
                item_id: item_id.to_string(),
                available,
            },
        )
    }

    pub fn update_tip(&self, actor: &str, tip: Money) -> SessionResult<()> {
        self.mutate(
            actor,
            |receipt| receipt.update_tip(tip),
            |_| ActivityAction::tip_updated(tip),
        )
    }

    pub fn set_tax_rate_percent(&self, actor: &str, rate: TaxRate) -> SessionResult<Money> {
        self.mutate(
            actor,
            |receipt| receipt.set_tax_rate_percent(rate),
            |tax| ActivityAction::TaxRateSet {
                bps: rate.bps(),
                tax_cents: tax.cents(),
            },
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Finalizes the receipt. Of several racing calls exactly one succeeds;
    /// the rest see `ReceiptFinalized`.
    pub fn finalize(&self, actor: &str) -> SessionResult<FinalizedSnapshot> {
        let snapshot = self.mutate(
            actor,
            |receipt| receipt.finalize().cloned(),
            |snapshot| ActivityAction::Finalized {
                grand_total_cents: snapshot.grand_total.cents(),
            },
        )?;
        info!(actor, users = snapshot.shares.len(), "Session finalized receipt");
        Ok(snapshot)
    }

    pub fn reopen(&self, actor: &str) -> SessionResult<()> {
        self.mutate(actor, Receipt::reopen, |_| ActivityAction::Reopened)?;
        info!(actor, "Session reopened receipt");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn status(&self) -> SessionResult<ReceiptStatus> {
        self.read(Receipt::status)
    }

    pub fn snapshot(&self) -> SessionResult<Option<FinalizedSnapshot>> {
        self.read(|receipt| receipt.snapshot().cloned())
    }

    pub fn remaining(&self, item_id: &str) -> SessionResult<i64> {
        Ok(self.read(|receipt| receipt.remaining(item_id))??)
    }

    pub fn total_claimed(&self, item_id: &str) -> SessionResult<i64> {
        self.read(|receipt| receipt.total_claimed(item_id))
    }

    pub fn claim_breakdown(&self, user_id: &str) -> SessionResult<Vec<ClaimLine>> {
        self.read(|receipt| receipt.claim_breakdown(user_id))
    }

    /// The split as it would finalize right now.
    pub fn preview(&self) -> SessionResult<FinalizedSnapshot> {
        Ok(self.read(Receipt::preview)??)
    }

    pub fn document(&self) -> SessionResult<ReceiptDocument> {
        self.read(Receipt::to_document)
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
    }
}

// =============================================================================
// Claim Permit
// =============================================================================

/// Exclusive right to mutate one user's claim on one item.
///
/// Dropping the permit releases the pair.
pub struct ClaimPermit<'a> {
    session: &'a ReceiptSession,
    key: ClaimKey,
}

impl ClaimPermit<'_> {
    pub fn item_id(&self) -> &str {
        &self.key.0
    }

    pub fn user_id(&self) -> &str {
        &self.key.1
    }

    /// Sets the claim to exactly `quantity` units.
    pub fn set(&self, quantity: i64) -> SessionResult<Vec<Claim>> {
        let (item_id, user_id) = (&self.key.0, &self.key.1);
        self.session.mutate(
            user_id,
            |receipt| receipt.set_claim(item_id, user_id, quantity),
            |_| ActivityAction::Claimed {
                item_id: item_id.clone(),
                quantity,
            },
        )
    }

    /// Removes the claim; `false` if there was none.
    pub fn remove(&self) -> SessionResult<bool> {
        let (item_id, user_id) = (&self.key.0, &self.key.1);
        self.session.mutate(
            user_id,
            |receipt| receipt.remove_claim(item_id, user_id),
            |_| ActivityAction::Unclaimed {
                item_id: item_id.clone(),
            },
        )
    }
}

impl Drop for ClaimPermit<'_> {
    fn drop(&mut self) {
        self.session
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
