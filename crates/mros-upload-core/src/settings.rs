// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Settings persistence
//
// Settings are stored in a local JSON file next to the upload history.

use crate::types::UploadError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default anonymous hosting endpoint
pub const DEFAULT_ENDPOINT_URL: &str = "https://bashupload.com";

const SETTINGS_FILE_NAME: &str = "settings.json";

/// User-facing upload settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSettings {
    /// Base URL files are POSTed to
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    /// Per-transfer timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between files of a multi-file batch, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Copy the download URL to the clipboard after each upload
    #[serde(default = "default_true")]
    pub auto_copy_url: bool,
    /// Show desktop notifications for upload progress
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            timeout_secs: default_timeout_secs(),
            batch_delay_ms: default_batch_delay_ms(),
            auto_copy_url: true,
            notifications_enabled: true,
        }
    }
}

impl UploadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Per-user configuration directory (`~/.config/mros-upload` on Linux)
pub fn config_dir() -> Result<PathBuf, UploadError> {
    let config_dir = directories::ProjectDirs::from("", "", "mros-upload")
        .ok_or_else(|| {
            UploadError::Persistence("Could not determine config directory".to_string())
        })?
        .config_dir()
        .to_path_buf();

    // Ensure the directory exists
    fs::create_dir_all(&config_dir)
        .map_err(|e| UploadError::Persistence(format!("Failed to create config dir: {}", e)))?;

    Ok(config_dir)
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<UploadSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Open the settings file in the per-user config directory
    pub fn new() -> Result<Self, UploadError> {
        Ok(Self::with_path(config_dir()?.join(SETTINGS_FILE_NAME)))
    }

    /// Open a settings store backed by `file_path`.
    ///
    /// An unreadable or unwritable file never stops uploads: the store logs
    /// a warning and serves defaults.
    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        tracing::debug!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            match fs::read_to_string(&file_path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse settings, using defaults: {}", e);
                    UploadSettings::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read settings, using defaults: {}", e);
                    UploadSettings::default()
                }
            }
        } else {
            tracing::info!("No settings file found, using defaults");
            UploadSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        // Persist default settings if file doesn't exist
        if !store.file_path.exists() {
            if let Err(e) = store.persist() {
                tracing::warn!("Could not write default settings: {}", e);
            }
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self) -> Result<(), UploadError> {
        let settings = self.get();

        let content = serde_json::to_string_pretty(&settings).map_err(|e| {
            UploadError::Persistence(format!("Failed to serialize settings: {}", e))
        })?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                UploadError::Persistence(format!("Failed to create config dir: {}", e))
            })?;
        }

        fs::write(&self.file_path, content)
            .map_err(|e| UploadError::Persistence(format!("Failed to write settings: {}", e)))
    }

    /// Get current settings
    pub fn get(&self) -> UploadSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update settings and persist to disk
    pub fn update(&self, new_settings: UploadSettings) -> Result<(), UploadError> {
        tracing::info!("Updating settings, endpoint: {}", new_settings.endpoint_url);
        {
            let mut settings = self
                .settings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *settings = new_settings;
        }

        let result = self.persist();
        if let Err(e) = &result {
            tracing::error!("Failed to persist settings: {}", e);
        }
        result
    }
}
