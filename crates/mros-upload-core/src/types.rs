// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Type definitions

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lifecycle state of one upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// In flight. Never written to disk.
    Uploading,
    Completed,
    Failed,
}

impl UploadStatus {
    /// Whether this is a final state that may be stored in history
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Uploading)
    }

    /// Glyph used by text frontends
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Completed => "✓",
            Self::Uploading | Self::Failed => "✗",
        }
    }
}

/// One entry of the upload history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Display name, not a path
    pub filename: String,
    /// Absolute source path at upload time. May no longer exist.
    pub filepath: String,
    /// Size in bytes, 0 when the file could not be read
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Seconds since the epoch, taken when the upload started
    pub timestamp: f64,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadRecord {
    /// Record for a finished upload; derives the upload id from the URL
    pub fn completed(
        filename: String,
        filepath: String,
        size: u64,
        mime_type: Option<String>,
        timestamp: f64,
        download_url: String,
    ) -> Self {
        Self {
            filename,
            filepath,
            size,
            mime_type,
            timestamp,
            status: UploadStatus::Completed,
            upload_id: Some(upload_id_for(&download_url)),
            download_url: Some(download_url),
            error: None,
        }
    }

    /// Record for a failed upload
    pub fn failed(
        filename: String,
        filepath: String,
        size: u64,
        mime_type: Option<String>,
        timestamp: f64,
        error: String,
    ) -> Self {
        Self {
            filename,
            filepath,
            size,
            mime_type,
            timestamp,
            status: UploadStatus::Failed,
            download_url: None,
            upload_id: None,
            error: Some(error),
        }
    }
}

/// Short identifier derived from a download URL.
///
/// The same URL always yields the same id. Ids are for display and
/// de-duplication only; collisions are not checked.
pub fn upload_id_for(download_url: &str) -> String {
    let digest = Sha256::digest(download_url.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..8].to_string()
}

/// Result of one file in a batch, as handed back to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    pub fn succeeded(filename: String, size: u64, url: String) -> Self {
        Self {
            success: true,
            filename,
            size: Some(size),
            url: Some(url),
            error: None,
        }
    }

    pub fn failed(filename: String, error: String) -> Self {
        Self {
            success: false,
            filename,
            size: None,
            url: None,
            error: Some(error),
        }
    }

    /// One-line report: `✓ name: url` or `✗ name: error`
    pub fn report_line(&self) -> String {
        if self.success {
            format!(
                "✓ {}: {}",
                self.filename,
                self.url.as_deref().unwrap_or_default()
            )
        } else {
            format!(
                "✗ {}: {}",
                self.filename,
                self.error.as_deref().unwrap_or_default()
            )
        }
    }
}

/// Success/failure counts over a list of batch results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Status bar text shown once a batch finishes
    pub fn status_message(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Upload complete: {} files uploaded successfully",
                self.total
            )
        } else {
            format!(
                "Upload complete: {} successful, {} failed",
                self.successful, self.failed
            )
        }
    }
}

/// Kind of desktop notification, selects the icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    Info,
    UploadStart,
    UploadProgress,
    UploadSuccess,
    UploadError,
    UploadWarning,
}

impl NotificationKind {
    /// Parse a kind name; unknown names fall back to `Info`
    pub fn from_name(name: &str) -> Self {
        match name {
            "upload-start" => Self::UploadStart,
            "upload-progress" => Self::UploadProgress,
            "upload-success" => Self::UploadSuccess,
            "upload-error" => Self::UploadError,
            "upload-warning" => Self::UploadWarning,
            _ => Self::Info,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::UploadStart => "upload-start",
            Self::UploadProgress => "upload-progress",
            Self::UploadSuccess => "upload-success",
            Self::UploadError => "upload-error",
            Self::UploadWarning => "upload-warning",
        }
    }

    /// Freedesktop icon name for this kind
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Info => "dialog-information",
            Self::UploadStart | Self::UploadProgress => "cloud-upload",
            Self::UploadSuccess => "dialog-ok-apply",
            Self::UploadError => "dialog-error",
            Self::UploadWarning => "dialog-warning",
        }
    }
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Error types for the upload service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Upload failed: HTTP {status}")]
    Remote { status: u16 },

    #[error("Upload error: {0}")]
    Transfer(String),

    #[error("History persistence error: {0}")]
    Persistence(String),

    #[error("Side effect failed: {0}")]
    SideEffect(String),
}
