//! # Error Types
//!
//! Domain-specific error types for tabsplit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tabsplit-core errors (this file)                                      │
//! │  ├── CoreError        - Ledger, lifecycle and finalization failures    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tabsplit-session errors (separate crate)                              │
//! │  └── SessionError     - Locking, config, CLI I/O                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is returned synchronously. None of them leave state half
//! mutated: the operation that produced them is a no-op.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-correctable input problem.
    Validation,
    /// Operation not allowed in the receipt's current lifecycle state.
    State,
    /// Referenced item does not exist on the receipt.
    NotFound,
}

// =============================================================================
// Core Error
// =============================================================================

/// Claim ledger, lifecycle and finalization errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Claimed quantity or split weight is zero or negative.
    ///
    /// ## When This Occurs
    /// - `set_claim` with `quantity <= 0` (use `remove_claim` to clear)
    /// - A split map containing a non-positive share count
    #[error("Invalid quantity {quantity}: must be greater than zero")]
    InvalidQuantity { quantity: i64 },

    /// Claim would take more units than the item has left.
    ///
    /// ## User Workflow
    /// ```text
    /// Item "Pizza" quantity 3, alice holds 2
    ///      │
    ///      ▼
    /// bob: set_claim(pizza, 2)
    ///      │
    ///      ▼
    /// remaining = 3 - 2 = 1 < 2
    ///      │
    ///      ▼
    /// OverAllocation { item_id: "pizza", requested: 2, remaining: 1 }
    /// ```
    #[error("Cannot claim {requested} of item {item_id}: only {remaining} remaining")]
    OverAllocation {
        item_id: String,
        requested: i64,
        remaining: i64,
    },

    /// Split map is empty or its weights sum to zero.
    #[error("Split for item {item_id} has no shares")]
    EmptySplit { item_id: String },

    /// Finalize requested but no item is available.
    #[error("Receipt has no available items to finalize")]
    NoItems,

    /// Tax or tip exists but nobody claimed anything to carry it.
    #[error("No available item has been claimed; tax and tip cannot be distributed")]
    NothingClaimed,

    /// Mutation attempted on a finalized receipt.
    #[error("Receipt {receipt_id} is finalized; reopen it before editing")]
    ReceiptFinalized { receipt_id: String },

    /// Reopen attempted on a receipt that is already open.
    #[error("Receipt {receipt_id} is not finalized")]
    NotFinalized { receipt_id: String },

    /// Item id is not on this receipt.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item is marked unavailable and cannot take new claims.
    #[error("Item {0} is unavailable")]
    ItemUnavailable(String),

    /// Item id is already on this receipt.
    #[error("Item {0} already exists on this receipt")]
    DuplicateItem(String),

    /// Receipt has reached its configured item limit.
    #[error("Receipt cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Item has reached its configured claimant limit.
    #[error("Item {item_id} cannot have more than {max} claimants")]
    TooManyClaimants { item_id: String, max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error per the validation / state / not-found taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ReceiptFinalized { .. } | CoreError::NotFinalized { .. } => ErrorKind::State,
            CoreError::ItemNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CoreError::OverAllocation { .. } => "OVER_ALLOCATION",
            CoreError::EmptySplit { .. } => "EMPTY_SPLIT",
            CoreError::NoItems => "NO_ITEMS",
            CoreError::NothingClaimed => "NOTHING_CLAIMED",
            CoreError::ReceiptFinalized { .. } => "RECEIPT_FINALIZED",
            CoreError::NotFinalized { .. } => "NOT_FINALIZED",
            CoreError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            CoreError::ItemUnavailable(_) => "ITEM_UNAVAILABLE",
            CoreError::DuplicateItem(_) => "DUPLICATE_ITEM",
            CoreError::TooManyItems { .. } => "TOO_MANY_ITEMS",
            CoreError::TooManyClaimants { .. } => "TOO_MANY_CLAIMANTS",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when boundary input (item records, decimal strings,
/// receipt totals) doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
