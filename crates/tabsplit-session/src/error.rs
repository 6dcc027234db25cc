//! # Session Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │   Concurrency   │  │    Configuration        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  ClaimInFlight  │  │  InvalidConfig          │ │
//! │  │                 │  │  LockPoisoned   │  │  ConfigLoad / Parse     │ │
//! │  │                 │  │                 │  │  ConfigSerialize        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   Documents     │   Io, Json                                        │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tabsplit_core::CoreError;
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Rejected by the receipt itself (validation or lifecycle).
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Concurrency Errors
    // =========================================================================
    /// Another mutation for the same (item, user) pair is still running.
    #[error("A claim update for item {item_id} by {user_id} is already in progress")]
    ClaimInFlight { item_id: String, user_id: String },

    /// A thread panicked while holding the receipt lock.
    #[error("Receipt state lock poisoned")]
    LockPoisoned,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    // =========================================================================
    // Document Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid receipt document: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Stable machine-readable code, passing core codes through.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Core(err) => err.code(),
            SessionError::ClaimInFlight { .. } => "CLAIM_IN_FLIGHT",
            SessionError::LockPoisoned => "LOCK_POISONED",
            SessionError::InvalidConfig(_)
            | SessionError::ConfigLoad(_)
            | SessionError::ConfigParse(_)
            | SessionError::ConfigSerialize(_) => "CONFIG_ERROR",
            SessionError::Io(_) => "IO_ERROR",
            SessionError::Json(_) => "INVALID_DOCUMENT",
        }
    }

    /// Whether retrying the same call later can succeed.
    ///
    /// Only an in-flight claim clears on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::ClaimInFlight { .. })
    }

    /// Whether this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidConfig(_)
                | SessionError::ConfigLoad(_)
                | SessionError::ConfigParse(_)
                | SessionError::ConfigSerialize(_)
        )
    }
}
