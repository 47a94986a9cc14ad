//! Logger configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the engine is hosted, reported in the environment block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostContext {
    #[default]
    Standalone,
    Plugin {
        /// Plugin format, e.g. "VST3", "AU", "CLAP".
        format: String,
        /// Host application description.
        host: String,
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

/// Configuration for the logger session and its drain worker.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// product_name = "MySampler"
/// company_name = "Acme Audio"
/// drain_interval_ms = 100
///
/// [host]
/// kind = "plugin"
/// format = "VST3"
/// host = "Reaper"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Product name (default: "dropwatch")
    pub product_name: String,
    /// Product version (default: this crate's version)
    pub product_version: String,
    /// Prefixed to the product name in the header when set.
    pub company_name: Option<String>,
    /// Folder for log files; platform data directory when unset.
    pub log_folder: Option<PathBuf>,
    /// Log file name (default: "Debuglog.txt")
    pub file_name: String,
    /// Drain period in milliseconds (default: 200)
    pub drain_interval_ms: u64,
    /// Reserved entries per kind in the pending queues (default: 512)
    pub queue_capacity: usize,
    pub host: HostContext,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            product_name: "dropwatch".to_string(),
            product_version: env!("CARGO_PKG_VERSION").to_string(),
            company_name: None,
            log_folder: None,
            file_name: "Debuglog.txt".to_string(),
            drain_interval_ms: 200,
            queue_capacity: dropwatch_core::MESSAGE_SLOTS,
            host: HostContext::Standalone,
        }
    }
}

impl LoggerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> String {
        // Infallible for this type.
        toml::to_string(self).unwrap_or_default()
    }

    /// Drain period, at least one millisecond.
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms.max(1))
    }

    /// Queue capacity, at least one slot.
    pub fn queue_slots(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Name shown in the report header.
    pub fn product_label(&self) -> String {
        match &self.company_name {
            Some(company) => format!("{} - {}", company, self.product_name),
            None => self.product_name.clone(),
        }
    }

    /// Configured folder, or `<data dir>/<product>/Logs`.
    pub fn resolved_log_folder(&self) -> Result<PathBuf> {
        if let Some(folder) = &self.log_folder {
            return Ok(folder.clone());
        }
        default_log_folder(&self.product_name).ok_or(Error::NoLogFolder)
    }
}

/// `<local data dir>/<product>/Logs`, falling back to the home directory.
pub fn default_log_folder(product_name: &str) -> Option<PathBuf> {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(product_name).join("Logs"))
}
