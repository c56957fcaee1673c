use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_KEY: &str = "bca_year2_students_data";
pub const DEFAULT_DEPARTMENT: &str = "Computer Applications";
pub const DEFAULT_CURRENCY: &str = "₹";
pub const DEFAULT_EXPORT_FILE_NAME: &str = "BCA_Year2_Students.csv";
pub const CONFIG_FILE_NAME: &str = "feesd.config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Slot key the record array lives under.
    pub storage_key: String,
    /// Constant department label written into every exported row.
    pub department: String,
    pub currency: String,
    pub export_file_name: String,
    /// Run add-time validation on update as well.
    pub strict_updates: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            department: DEFAULT_DEPARTMENT.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            strict_updates: false,
        }
    }
}

impl StoreConfig {
    pub fn config_file_path(workspace: &Path) -> PathBuf {
        workspace.join(CONFIG_FILE_NAME)
    }

    /// Reads `feesd.config.json` from the workspace. A missing file is not an error.
    pub fn from_workspace(workspace: &Path) -> anyhow::Result<Option<StoreConfig>> {
        let path = Self::config_file_path(workspace);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let cfg: StoreConfig = serde_json::from_str(&text)
            .with_context(|| format!("{} is invalid JSON", path.to_string_lossy()))?;
        Ok(Some(cfg))
    }

    /// Overlay request params on top of `self`. Only keys that are present win.
    pub fn with_overrides(mut self, params: &serde_json::Value) -> anyhow::Result<StoreConfig> {
        if let Some(v) = params.get("storageKey") {
            let key = v
                .as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| anyhow::anyhow!("storageKey must be a string"))?;
            if key.is_empty() {
                anyhow::bail!("storageKey must not be empty");
            }
            self.storage_key = key;
        }
        if let Some(v) = params.get("department") {
            self.department = v
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("department must be a string"))?
                .to_string();
        }
        if let Some(v) = params.get("currency") {
            self.currency = v
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("currency must be a string"))?
                .to_string();
        }
        if let Some(v) = params.get("exportFileName") {
            self.export_file_name = v
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("exportFileName must be a string"))?
                .to_string();
        }
        if let Some(v) = params.get("strictUpdates") {
            self.strict_updates = v
                .as_bool()
                .ok_or_else(|| anyhow::anyhow!("strictUpdates must be a boolean"))?;
        }
        Ok(self)
    }
}
