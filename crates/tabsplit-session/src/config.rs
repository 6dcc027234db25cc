//! # Session Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TABSPLIT_MAX_ITEMS=200                                             │
//! │     TABSPLIT_LOG=debug                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tabsplit/tabsplit.toml (Linux)                           │
//! │     ~/Library/Application Support/app.tabsplit.tabsplit/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [limits]
//! max_items = 500
//! max_item_quantity = 999
//! max_claimants_per_item = 64
//! max_share_weight = 10000
//!
//! [logging]
//! filter = "info,tabsplit=debug"
//!
//! [activity]
//! enabled = true
//! max_entries = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabsplit_core::validation::validate_limits;
use tabsplit_core::{
    ReceiptLimits, MAX_CLAIMANTS_PER_ITEM, MAX_ITEM_QUANTITY, MAX_RECEIPT_ITEMS, MAX_SHARE_WEIGHT,
};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Limits
// =============================================================================

/// Size limits applied to every receipt a session loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    #[serde(default = "default_max_claimants")]
    pub max_claimants_per_item: usize,

    /// Largest weight one claimant may hold when an item is split.
    #[serde(default = "default_max_share_weight")]
    pub max_share_weight: i64,
}

fn default_max_items() -> usize {
    MAX_RECEIPT_ITEMS
}

fn default_max_item_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}

fn default_max_claimants() -> usize {
    MAX_CLAIMANTS_PER_ITEM
}

fn default_max_share_weight() -> i64 {
    MAX_SHARE_WEIGHT
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_items: default_max_items(),
            max_item_quantity: default_max_item_quantity(),
            max_claimants_per_item: default_max_claimants(),
            max_share_weight: default_max_share_weight(),
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,tabsplit=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Activity
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Oldest entries are dropped past this count.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    1000
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig {
            enabled: true,
            max_entries: default_max_entries(),
        }
    }
}

// =============================================================================
// Main Session Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

impl SessionConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tabsplit.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| SessionError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::ConfigLoad("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Session config saved");
        Ok(())
    }

    /// Rejects limits outside the range a receipt accepts.
    pub fn validate(&self) -> SessionResult<()> {
        validate_limits(&self.receipt_limits())
            .map_err(|e| SessionError::InvalidConfig(format!("limits.{e}")))?;
        if self.activity.enabled && self.activity.max_entries == 0 {
            return Err(SessionError::InvalidConfig(
                "activity.max_entries must be greater than 0 when activity is enabled".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TABSPLIT_MAX_ITEMS") {
            match value.parse() {
                Ok(n) => self.limits.max_items = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TABSPLIT_MAX_ITEMS"),
            }
        }

        if let Ok(value) = std::env::var("TABSPLIT_MAX_ITEM_QUANTITY") {
            match value.parse() {
                Ok(n) => self.limits.max_item_quantity = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TABSPLIT_MAX_ITEM_QUANTITY"),
            }
        }

        if let Ok(value) = std::env::var("TABSPLIT_MAX_CLAIMANTS") {
            match value.parse() {
                Ok(n) => self.limits.max_claimants_per_item = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TABSPLIT_MAX_CLAIMANTS"),
            }
        }

        if let Ok(value) = std::env::var("TABSPLIT_MAX_SHARE_WEIGHT") {
            match value.parse() {
                Ok(n) => self.limits.max_share_weight = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TABSPLIT_MAX_SHARE_WEIGHT"),
            }
        }

        if let Ok(filter) = std::env::var("TABSPLIT_LOG") {
            debug!(filter = %filter, "Overriding log filter from environment");
            self.logging.filter = filter;
        }

        if let Ok(value) = std::env::var("TABSPLIT_ACTIVITY") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "on" => self.activity.enabled = true,
                "0" | "false" | "off" => self.activity.enabled = false,
                _ => warn!(value = %value, "Unknown TABSPLIT_ACTIVITY value"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("app", "tabsplit", "tabsplit")
            .map(|dirs| dirs.config_dir().join("tabsplit.toml"))
    }

    /// Limits in the form the core receipt takes.
    pub fn receipt_limits(&self) -> ReceiptLimits {
        ReceiptLimits {
            max_items: self.limits.max_items,
            max_item_quantity: self.limits.max_item_quantity,
            max_claimants_per_item: self.limits.max_claimants_per_item,
            max_share_weight: self.limits.max_share_weight,
        }
    }
}
