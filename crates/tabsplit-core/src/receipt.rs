//! # Receipt Aggregate
//!
//! One receipt: its recorded totals, its items, the claim ledger, and the
//! lifecycle state machine. Every mutation goes through here so the status
//! check happens in one place.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐        finalize()         ┌─────────────┐                  │
//! │   │  Open  │ ────────────────────────► │  Finalized  │                  │
//! │   │        │                           │  snapshot   │                  │
//! │   │ claims │ ◄──────────────────────── │  frozen     │                  │
//! │   │ items  │         reopen()          └─────────────┘                  │
//! │   └────────┘   (snapshot discarded)                                     │
//! │                                                                         │
//! │   Open:      set_claim, remove_claim, set_split, add_item,              │
//! │              update_item, set_item_availability, update_tip,            │
//! │              set_tax_rate_percent                                       │
//! │   Finalized: all of the above fail with ReceiptFinalized                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! `snapshot.is_some() == (status == Finalized)`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::allocator::allocate;
use crate::availability::{effective_tax_rate, filter_available, AvailableSet};
use crate::error::{CoreError, CoreResult};
use crate::finalize::finalize;
use crate::ledger::ClaimLedger;
use crate::money::Money;
use crate::types::{
    Claim, ClaimLine, FinalizedSnapshot, Item, ItemUpdate, ReceiptLimits, ReceiptStatus,
    ReceiptTotals, TaxRate,
};
use crate::validation::{
    validate_amount, validate_id, validate_item, validate_item_name, validate_item_quantity,
    validate_limits, validate_tax_rate_bps, validate_totals,
};

// =============================================================================
// Receipt Document
// =============================================================================

/// Serialized form of an open receipt: what the caller loads from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptDocument {
    pub id: String,
    pub totals: ReceiptTotals,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// Items whose claims are relative weights rather than units.
    #[serde(default)]
    pub split_items: Vec<String>,
}

// =============================================================================
// Receipt
// =============================================================================

/// A receipt and everything claimed on it.
#[derive(Debug, Clone)]
pub struct Receipt {
    id: String,
    totals: ReceiptTotals,
    items: Vec<Item>,
    ledger: ClaimLedger,
    status: ReceiptStatus,
    snapshot: Option<FinalizedSnapshot>,
    finalized_at: Option<DateTime<Utc>>,
    limits: ReceiptLimits,
}

impl Receipt {
    /// Creates an open receipt with default limits.
    pub fn new(id: impl Into<String>, totals: ReceiptTotals) -> CoreResult<Self> {
        Receipt::with_limits(id, totals, ReceiptLimits::default())
    }

    /// Creates an open receipt with explicit limits.
    pub fn with_limits(
        id: impl Into<String>,
        totals: ReceiptTotals,
        limits: ReceiptLimits,
    ) -> CoreResult<Self> {
        let id = id.into();
        validate_id("receipt_id", &id)?;
        validate_totals(&totals)?;
        validate_limits(&limits)?;

        Ok(Receipt {
            id,
            totals,
            items: Vec::new(),
            ledger: ClaimLedger::new(limits.max_claimants_per_item, limits.max_share_weight),
            status: ReceiptStatus::Open,
            snapshot: None,
            finalized_at: None,
            limits,
        })
    }

    /// Rebuilds an open receipt from stored records.
    ///
    /// Items go through the same checks as [`Receipt::add_item`]. Claims are
    /// loaded without the capacity check since stored split weights may
    /// legitimately exceed an item's quantity. Items listed in
    /// `split_items` keep split mode even when their weights fit. A claim
    /// or split flag on an unknown item fails with `ItemNotFound`.
    pub fn from_document(document: ReceiptDocument, limits: ReceiptLimits) -> CoreResult<Self> {
        let mut receipt = Receipt::with_limits(document.id, document.totals, limits)?;
        for item in document.items {
            receipt.add_item(item)?;
        }
        for claim in document.claims {
            receipt.restore_claim(claim)?;
        }
        for item_id in &document.split_items {
            receipt.item_index(item_id)?;
            receipt.ledger.mark_split(item_id);
        }
        debug!(
            receipt_id = %receipt.id,
            items = receipt.items.len(),
            claims = receipt.ledger.len(),
            "Receipt loaded"
        );
        Ok(receipt)
    }

    /// Current items and claims as a document.
    pub fn to_document(&self) -> ReceiptDocument {
        ReceiptDocument {
            id: self.id.clone(),
            totals: self.totals,
            items: self.items.clone(),
            claims: self.ledger.iter().cloned().collect(),
            split_items: self.ledger.split_items().map(str::to_string).collect(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn totals(&self) -> &ReceiptTotals {
        &self.totals
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Looks up an item by id.
    pub fn item(&self, item_id: &str) -> CoreResult<&Item> {
        self.items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    pub fn ledger(&self) -> &ClaimLedger {
        &self.ledger
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status == ReceiptStatus::Finalized
    }

    /// The authoritative split; `Some` only while finalized.
    pub fn snapshot(&self) -> Option<&FinalizedSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    pub fn limits(&self) -> &ReceiptLimits {
        &self.limits
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_finalized() {
            return Err(CoreError::ReceiptFinalized {
                receipt_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn item_index(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    // =========================================================================
    // Claim Operations
    // =========================================================================

    /// Sets the user's claim on the item to exactly `quantity` units.
    ///
    /// Returns the item's claims after the write.
    pub fn set_claim(&mut self, item_id: &str, user_id: &str, quantity: i64) -> CoreResult<Vec<Claim>> {
        self.ensure_open()?;
        let index = self.item_index(item_id)?;
        self.ledger.set_claim(&self.items[index], user_id, quantity)
    }

    /// Removes the user's claim on the item. Returns whether one existed.
    pub fn remove_claim(&mut self, item_id: &str, user_id: &str) -> CoreResult<bool> {
        self.ensure_open()?;
        self.item_index(item_id)?;
        Ok(self.ledger.remove_claim(item_id, user_id))
    }

    /// Replaces every claim on the item with `shares` (user → weight).
    pub fn set_split(&mut self, item_id: &str, shares: &BTreeMap<String, i64>) -> CoreResult<Vec<Claim>> {
        self.ensure_open()?;
        let index = self.item_index(item_id)?;
        self.ledger.set_split(&self.items[index], shares)
    }

    /// Loads a stored claim record. See [`Receipt::from_document`].
    pub fn restore_claim(&mut self, claim: Claim) -> CoreResult<()> {
        self.ensure_open()?;
        let index = self.item_index(&claim.item_id)?;
        self.ledger.restore(&self.items[index], claim)
    }

    // =========================================================================
    // Claim Queries
    // =========================================================================

    pub fn total_claimed(&self, item_id: &str) -> i64 {
        self.ledger.total_claimed(item_id)
    }

    pub fn user_claimed(&self, item_id: &str, user_id: &str) -> i64 {
        self.ledger.user_claimed(item_id, user_id)
    }

    /// Units still claimable on the item; 0 when unavailable.
    pub fn remaining(&self, item_id: &str) -> CoreResult<i64> {
        Ok(self.ledger.remaining(self.item(item_id)?))
    }

    /// Claims on the item, ordered by user id.
    pub fn claims_for(&self, item_id: &str) -> Vec<Claim> {
        self.ledger.claims_for(item_id)
    }

    /// What the user would pay per available item, before tax and tip.
    ///
    /// Amounts are the same floored cents the finalizer accumulates, so
    /// they sum to the user's snapshot subtotal.
    pub fn claim_breakdown(&self, user_id: &str) -> Vec<ClaimLine> {
        self.items
            .iter()
            .filter(|item| item.available)
            .filter_map(|item| {
                let allocation = allocate(item, self.ledger.iter_item(&item.id));
                let share = allocation
                    .allocations
                    .iter()
                    .find(|share| share.user_id == user_id)?;
                Some(ClaimLine {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    claimed_quantity: share.weight,
                    total_shares: allocation.total_shares,
                    amount: share.amount,
                })
            })
            .collect()
    }

    /// The recorded tax as a fraction of the recorded subtotal, in bps.
    pub fn effective_tax_rate(&self) -> TaxRate {
        effective_tax_rate(&self.totals)
    }

    /// The items and amounts a finalization pass would use right now.
    pub fn available_set(&self) -> AvailableSet<'_> {
        filter_available(&self.items, &self.totals)
    }

    // =========================================================================
    // Item Operations
    // =========================================================================

    /// Appends an item.
    ///
    /// ## Errors
    /// - `DuplicateItem` if the id is taken
    /// - `TooManyItems` past `limits.max_items`
    /// - `Validation` for a bad id, name, quantity or price
    pub fn add_item(&mut self, item: Item) -> CoreResult<()> {
        self.ensure_open()?;
        validate_item(&item, &self.limits)?;
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Err(CoreError::DuplicateItem(item.id));
        }
        if self.items.len() >= self.limits.max_items {
            return Err(CoreError::TooManyItems {
                max: self.limits.max_items,
            });
        }

        debug!(receipt_id = %self.id, item_id = %item.id, price = %item.total_price, "Item added");
        self.items.push(item);
        Ok(())
    }

    /// Edits an item's name, quantity or price.
    ///
    /// A unit-claimed item can't shrink below what is already claimed.
    pub fn update_item(&mut self, item_id: &str, update: ItemUpdate) -> CoreResult<&Item> {
        self.ensure_open()?;
        let index = self.item_index(item_id)?;

        if let Some(name) = &update.name {
            validate_item_name(name)?;
        }
        if let Some(quantity) = update.quantity {
            validate_item_quantity(quantity, self.limits.max_item_quantity)?;
            self.ledger.check_quantity_change(&self.items[index], quantity)?;
        }
        if let Some(price) = update.total_price {
            validate_amount("total_price", price)?;
        }

        let item = &mut self.items[index];
        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(quantity) = update.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = update.total_price {
            item.total_price = price;
        }

        debug!(receipt_id = %self.id, item_id, "Item updated");
        Ok(&self.items[index])
    }

    /// Marks the item available or not. Claims are left alone.
    pub fn set_item_availability(&mut self, item_id: &str, available: bool) -> CoreResult<()> {
        self.ensure_open()?;
        let index = self.item_index(item_id)?;
        self.items[index].available = available;
        debug!(receipt_id = %self.id, item_id, available, "Item availability changed");
        Ok(())
    }

    // =========================================================================
    // Totals Operations
    // =========================================================================

    /// Replaces the tip and recomputes the recorded total.
    pub fn update_tip(&mut self, tip: Money) -> CoreResult<()> {
        self.ensure_open()?;
        validate_amount("tip_total", tip)?;
        self.totals = ReceiptTotals::new(self.totals.subtotal, self.totals.tax, tip);
        debug!(receipt_id = %self.id, tip = %tip, "Tip updated");
        Ok(())
    }

    /// Sets the recorded tax to `rate` applied to the available subtotal.
    ///
    /// Returns the new tax amount.
    pub fn set_tax_rate_percent(&mut self, rate: TaxRate) -> CoreResult<Money> {
        self.ensure_open()?;
        validate_tax_rate_bps(rate.bps())?;
        let tax = self.available_set().subtotal.calculate_tax(rate);
        validate_amount("tax_total", tax)?;
        self.totals = ReceiptTotals::new(self.totals.subtotal, tax, self.totals.tip);
        debug!(receipt_id = %self.id, bps = rate.bps(), tax = %tax, "Tax rate applied");
        Ok(tax)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Computes the split without changing state.
    pub fn preview(&self) -> CoreResult<FinalizedSnapshot> {
        finalize(&self.items, &self.ledger, &self.totals)
    }

    /// Freezes the receipt and stores the split.
    ///
    /// On error the receipt stays open and no snapshot is written.
    pub fn finalize(&mut self) -> CoreResult<&FinalizedSnapshot> {
        self.ensure_open()?;
        let snapshot = finalize(&self.items, &self.ledger, &self.totals)?;
        let finalized_at = Utc::now();

        info!(
            receipt_id = %self.id,
            users = snapshot.shares.len(),
            grand_total = %snapshot.grand_total,
            "Receipt finalized"
        );
        self.status = ReceiptStatus::Finalized;
        self.finalized_at = Some(finalized_at);
        Ok(&*self.snapshot.insert(snapshot))
    }

    /// Discards the snapshot and reopens the receipt for edits.
    pub fn reopen(&mut self) -> CoreResult<()> {
        if !self.is_finalized() {
            return Err(CoreError::NotFinalized {
                receipt_id: self.id.clone(),
            });
        }
        self.status = ReceiptStatus::Open;
        self.snapshot = None;
        self.finalized_at = None;
        info!(receipt_id = %self.id, "Receipt reopened");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
