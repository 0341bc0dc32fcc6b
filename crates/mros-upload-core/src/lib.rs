// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Upload service shared by every shell frontend
//
// This crate provides:
// - UploadService, the entry point for single, multi-file and folder uploads
// - UploadHistory for the persisted, capped upload log
// - SettingsStore for persistent upload settings
// - Clipboard and notification adapters with fallback chains
// - UploadBridge for running uploads off a GUI main loop
//
// Frontend-specific code lives in separate crates.

pub mod batch;
pub mod bridge;
pub mod clipboard;
pub mod history;
pub mod notify;
pub mod service;
pub mod settings;
pub mod transfer;
pub mod types;

// Re-export commonly used items
pub use bridge::{UploadBridge, UploadCommand, UploadEvent};
pub use clipboard::{ClipboardChain, ClipboardProvider};
pub use history::{UploadHistory, MAX_HISTORY_ENTRIES};
pub use notify::{NotificationProvider, Notifier};
pub use service::{UploadService, DEFAULT_HISTORY_LIMIT};
pub use settings::{SettingsStore, UploadSettings};
pub use types::{
    format_bytes, BatchResult, BatchSummary, NotificationKind, UploadError, UploadRecord,
    UploadStatus,
};
