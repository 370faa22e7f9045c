//! # Configuration State
//!
//! Terminal configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLY_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tally_core::Channel;
use tracing::warn;

/// Where the catalog and sales history live.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Sample data, nothing persisted across restarts
    #[default]
    Memory,

    /// `catalog.json` + `sales.jsonl` under `data_dir`
    File,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" => Ok(StorageKind::File),
            other => Err(format!("unknown storage kind '{other}' (expected memory or file)")),
        }
    }
}

/// Terminal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (shown on receipts)
    pub store_name: String,

    /// Identifies this till in logs
    pub terminal_id: String,

    pub storage: StorageKind,

    /// Data directory for `StorageKind::File`
    pub data_dir: PathBuf,

    /// Channel new carts start on
    pub default_channel: Channel,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for ConfigState {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Store: "Tally Dev Store"
    /// - Storage: in memory
    /// - Channel: in-store
    /// - Currency: USD ($)
    fn default() -> Self {
        ConfigState {
            store_name: "Tally Dev Store".to_string(),
            terminal_id: "till-01".to_string(),
            storage: StorageKind::Memory,
            data_dir: default_data_dir(),
            default_channel: Channel::InStore,
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

/// Platform data directory, or `./tally-data` when none can be determined.
///
/// - **macOS**: `~/Library/Application Support/com.tally.pos`
/// - **Windows**: `%APPDATA%\tally\pos\data`
/// - **Linux**: `~/.local/share/pos`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "tally", "pos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./tally-data"))
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TALLY_STORE_NAME`: Override store name
    /// - `TALLY_TERMINAL_ID`: Override terminal id
    /// - `TALLY_STORAGE`: `memory` or `file`
    /// - `TALLY_DATA_DIR`: Override data directory
    /// - `TALLY_DEFAULT_CHANNEL`: `in-store`, `online` or `phone`
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigState::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(store_name) = lookup("TALLY_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(terminal_id) = lookup("TALLY_TERMINAL_ID") {
            config.terminal_id = terminal_id;
        }

        if let Some(storage) = lookup("TALLY_STORAGE") {
            match storage.parse() {
                Ok(kind) => config.storage = kind,
                Err(e) => warn!(error = %e, "Ignoring TALLY_STORAGE"),
            }
        }

        if let Some(dir) = lookup("TALLY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(channel) = lookup("TALLY_DEFAULT_CHANNEL") {
            match channel.parse() {
                Ok(channel) => config.default_channel = channel,
                Err(e) => warn!(error = %e, "Ignoring TALLY_DEFAULT_CHANNEL"),
            }
        }

        config
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use tally_terminal::state::ConfigState;
    ///
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(630), "$6.30");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}
