//! # Activity Log
//!
//! Who did what to the receipt, newest last. Bounded: once `max_entries` is
//! reached the oldest entry is dropped for each new one.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabsplit_core::Money;

use crate::config::ActivityConfig;

/// A recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityAction {
    Claimed { item_id: String, quantity: i64 },
    Unclaimed { item_id: String },
    Split { item_id: String, claimants: usize },
    ItemAdded { item_id: String },
    ItemEdited { item_id: String },
    AvailabilityChanged { item_id: String, available: bool },
    TipUpdated { tip_cents: i64 },
    TaxRateSet { bps: u32, tax_cents: i64 },
    Finalized { grand_total_cents: i64 },
    Reopened,
}

impl ActivityAction {
    pub fn tip_updated(tip: Money) -> Self {
        ActivityAction::TipUpdated {
            tip_cents: tip.cents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub actor: String,
    pub action: ActivityAction,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    enabled: bool,
    max_entries: usize,
}

impl ActivityLog {
    pub fn new(config: &ActivityConfig) -> Self {
        ActivityLog {
            entries: VecDeque::new(),
            enabled: config.enabled,
            max_entries: config.max_entries,
        }
    }

    /// Appends an entry, evicting the oldest past capacity. No-op when
    /// disabled.
    pub fn record(&mut self, actor: &str, action: ActivityAction) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }
        while self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            at: Utc::now(),
            actor: actor.to_string(),
            action,
        });
    }

    /// Copies of all entries, oldest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }
}
