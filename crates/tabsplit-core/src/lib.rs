//! # tabsplit-core: Claim Ledger and Finalization Engine
//!
//! Splits a shared receipt between the people who ate from it. Users claim
//! items (or shares of items), and finalization turns those claims into
//! exact per-user amounts, tax and tip included, to the cent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        tabsplit Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Caller (web handler, CLI, storage layer)             │   │
//! │  │    load items + claims ──► mutate ──► persist snapshot          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tabsplit-session                                │   │
//! │  │    per-(item,user) permits, receipt lock, activity, config      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tabsplit-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   receipt ──► ledger            (claims, capacity, splits)      │   │
//! │  │      │                                                          │   │
//! │  │      └─────► finalize ──► availability ──► allocator            │   │
//! │  │                                                                 │   │
//! │  │   money • types • validation • error                            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO THREADS • INTEGER CENTS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` in integer cents, decimal parsing and formatting
//! - [`types`] - Items, claims, totals, snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`ledger`] - Claim Ledger
//! - [`availability`] - Availability Filter and tax re-derivation
//! - [`allocator`] - Share Allocator
//! - [`finalize`] - Finalization Engine
//! - [`receipt`] - Receipt aggregate and lifecycle
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tabsplit_core::{Item, Money, Receipt, ReceiptTotals};
//!
//! let totals = ReceiptTotals::new(
//!     Money::from_cents(3000), // subtotal
//!     Money::from_cents(300),  // tax
//!     Money::from_cents(500),  // tip
//! );
//! let mut receipt = Receipt::new("dinner", totals).unwrap();
//! receipt.add_item(Item::new("a", "Pizza", 1, Money::from_cents(2000))).unwrap();
//! receipt
//!     .add_item(Item::new("b", "Wine", 1, Money::from_cents(1000)).with_available(false))
//!     .unwrap();
//!
//! let split = BTreeMap::from([("user1".to_string(), 1), ("user2".to_string(), 1)]);
//! receipt.set_split("a", &split).unwrap();
//!
//! let snapshot = receipt.finalize().unwrap();
//! assert_eq!(snapshot.shares["user1"].total.to_decimal_string(), "13.50");
//! assert_eq!(snapshot.grand_total.cents(), 2700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod availability;
pub mod error;
pub mod finalize;
pub mod ledger;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use ledger::ClaimLedger;
pub use money::Money;
pub use receipt::{Receipt, ReceiptDocument};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum items on a single receipt.
pub const MAX_RECEIPT_ITEMS: usize = 500;

/// Maximum unit count on a single item line.
///
/// Catches OCR slips like "1000" for "10".
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum distinct claimants on one item.
pub const MAX_CLAIMANTS_PER_ITEM: usize = 64;

/// Largest relative weight one claimant may hold in a split.
pub const MAX_SHARE_WEIGHT: i64 = 10_000;
