//! # tabsplit-session: Concurrent Claim Layer
//!
//! Puts a `tabsplit_core::Receipt` behind a lock so many users can claim
//! items at once without losing updates or over-claiming.
//!
//! ## Modules
//!
//! - [`session`] - `ReceiptSession` and `ClaimPermit`
//! - [`activity`] - Bounded mutation history
//! - [`config`] - TOML + env configuration
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Session error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tabsplit_core::{Item, Money, Receipt, ReceiptTotals};
//! use tabsplit_session::{ReceiptSession, SessionConfig};
//!
//! let totals = ReceiptTotals::new(Money::from_cents(1000), Money::zero(), Money::zero());
//! let mut receipt = Receipt::new("lunch", totals).unwrap();
//! receipt.add_item(Item::new("a", "Fries", 2, Money::from_cents(1000))).unwrap();
//!
//! let session = ReceiptSession::new(receipt, &SessionConfig::default());
//! {
//!     let permit = session.begin_claim("a", "alice").unwrap();
//!     permit.set(1).unwrap();
//! }
//! session.set_claim("a", "bob", 1).unwrap();
//!
//! let snapshot = session.finalize("alice").unwrap();
//! assert_eq!(snapshot.shares["alice"].total.cents(), 500);
//! ```

pub mod activity;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;

pub use activity::{ActivityAction, ActivityEntry, ActivityLog};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::{ClaimPermit, ReceiptSession};
pub use telemetry::init_tracing;
