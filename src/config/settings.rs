//! User settings
//!
//! Defaults for new workspaces, the inbox name, and logging verbosity.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;
use crate::models::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency code for workspaces created without one
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Name given to the inbox bucket of new workspaces
    #[serde(default = "default_inbox_name")]
    pub inbox_name: String,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Identity the CLI acts as when creating workspaces
    #[serde(default)]
    pub local_user: UserId,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_inbox_name() -> String {
    "Inbox".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            inbox_name: default_inbox_name(),
            log_level: default_log_level(),
            date_format: default_date_format(),
            local_user: UserId::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            serde_json::from_str(&contents)
                .map_err(|e| LedgerError::Config(format!("Failed to parse settings file: {}", e)))
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
