//! Configuration management
//!
//! Settings live in `settings.json` inside the extractos directory:
//! ```json
//! {
//!   "rowPolicy": "drop",
//!   "maxFileSizeBytes": 209715200,
//!   "upload": { "maxAttempts": 3, "retryDelayMs": 2000 },
//!   "output": { "fileName": "estados_de_cuenta_fusionados.xlsx", "sheetName": "Estados Fusionados" },
//!   "stagingDir": null
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::RowPolicy;
use crate::services::upload::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_FILE_SIZE, DEFAULT_RETRY_DELAY_MS};
use crate::services::{RetryPolicy, DEFAULT_FILE_NAME, DEFAULT_SHEET_NAME};

/// Environment override for the row policy
pub const ROW_POLICY_ENV: &str = "EXTRACTOS_ROW_POLICY";

const SETTINGS_FILE: &str = "settings.json";

/// Keys accepted by [`Config::set`]
pub const SETTING_KEYS: &[&str] = &[
    "rowPolicy",
    "maxFileSizeBytes",
    "upload.maxAttempts",
    "upload.retryDelayMs",
    "output.fileName",
    "output.sheetName",
    "stagingDir",
];

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    row_policy: Option<RowPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_file_size_bytes: Option<u64>,
    #[serde(default)]
    upload: UploadSettings,
    #[serde(default)]
    output: OutputSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    staging_dir: Option<PathBuf>,
    // Keys this version does not manage, kept on save
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

/// Extractos configuration (resolved view of settings)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub row_policy: RowPolicy,
    pub max_file_size_bytes: u64,
    pub upload: UploadSettings,
    pub output: OutputSettings,
    pub staging_dir: Option<PathBuf>,
    // Row policy as stored in the file, without the environment override
    #[serde(skip)]
    stored_row_policy: Option<RowPolicy>,
    // Keep the raw settings for preservation when saving
    #[serde(skip)]
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_policy: RowPolicy::default(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            upload: UploadSettings::default(),
            output: OutputSettings::default(),
            staging_dir: None,
            stored_row_policy: None,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the extractos directory
    ///
    /// A missing settings file yields the defaults. The row policy can be
    /// overridden with `EXTRACTOS_ROW_POLICY`.
    pub fn load(dir: &Path) -> Result<Self> {
        let env_policy = std::env::var(ROW_POLICY_ENV).ok();
        Self::load_with_override(dir, env_policy.as_deref())
    }

    fn load_with_override(dir: &Path, row_policy_override: Option<&str>) -> Result<Self> {
        let settings_path = dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("{} is not valid: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        let row_policy = match row_policy_override {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => raw.row_policy.unwrap_or_default(),
        };

        let config = Self {
            row_policy,
            max_file_size_bytes: raw.max_file_size_bytes.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            upload: raw.upload.clone(),
            output: raw.output.clone(),
            staging_dir: raw.staging_dir.clone(),
            stored_row_policy: raw.row_policy,
            _raw_settings: raw,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to the extractos directory
    /// Preserves other settings this version doesn't manage. An environment
    /// override of the row policy is never written.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let settings_path = dir.join(SETTINGS_FILE);

        // Load existing settings to preserve fields we don't manage
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content)
                .unwrap_or_else(|_| self._raw_settings.clone())
        } else {
            self._raw_settings.clone()
        };

        settings.row_policy = self.stored_row_policy;
        settings.max_file_size_bytes = Some(self.max_file_size_bytes);
        settings.upload = self.upload.clone();
        settings.output = self.output.clone();
        settings.staging_dir = self.staging_dir.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Update one setting from its `settings.json` key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let mut next = self.clone();
        match key {
            "rowPolicy" => {
                next.row_policy = value.parse()?;
                next.stored_row_policy = Some(next.row_policy);
            }
            "maxFileSizeBytes" => next.max_file_size_bytes = parse_number(key, value)?,
            "upload.maxAttempts" => next.upload.max_attempts = parse_number(key, value)?,
            "upload.retryDelayMs" => next.upload.retry_delay_ms = parse_number(key, value)?,
            "output.fileName" => next.output.file_name = value.to_string(),
            "output.sheetName" => next.output.sheet_name = value.to_string(),
            "stagingDir" => {
                next.staging_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            _ => {
                return Err(Error::config(format!(
                    "Unknown setting '{}'. Known settings: {}",
                    key,
                    SETTING_KEYS.join(", ")
                )))
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Retry policy for reading uploaded files
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.upload.max_attempts,
            Duration::from_millis(self.upload.retry_delay_ms),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.max_file_size_bytes == 0 {
            return Err(Error::config("maxFileSizeBytes must be greater than zero"));
        }
        if self.upload.max_attempts == 0 {
            return Err(Error::config("upload.maxAttempts must be at least 1"));
        }
        if self.output.file_name.trim().is_empty() {
            return Err(Error::config("output.fileName must not be empty"));
        }
        let sheet = self.output.sheet_name.trim();
        if sheet.is_empty() || sheet.chars().count() > 31 {
            return Err(Error::config("output.sheetName must be 1 to 31 characters"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{} expects a whole number, got '{}'", key, value)))
}
