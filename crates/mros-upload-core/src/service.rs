// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Upload service
//
// Entry point used by the CLI, the upload manager, the file manager and the
// taskbar. Each process builds its own instance; there is no global service.
//
// Calls never fail: every problem ends up in the returned results. One
// batch at a time per instance; embedders that run batches concurrently must
// serialise them (see `bridge::UploadBridge`).

use crate::batch::BatchUploader;
use crate::clipboard::{ClipboardChain, ClipboardProvider};
use crate::history::UploadHistory;
use crate::notify::Notifier;
use crate::settings::{SettingsStore, UploadSettings};
use crate::transfer::{display_name, TransferExecutor};
use crate::types::{BatchResult, UploadError, UploadRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of records returned by history listings
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub struct UploadService {
    batch: BatchUploader,
    history: Arc<UploadHistory>,
    notify: bool,
}

impl UploadService {
    /// Build a service that talks to the real clipboard and notifier
    pub fn new(settings: &UploadSettings, history: UploadHistory) -> Result<Self, UploadError> {
        Self::with_side_effects(
            settings,
            history,
            Arc::new(ClipboardChain::system()),
            Arc::new(Notifier::system()),
        )
    }

    /// Build a service with explicit clipboard and notification adapters
    pub fn with_side_effects(
        settings: &UploadSettings,
        history: UploadHistory,
        clipboard: Arc<dyn ClipboardProvider>,
        notifier: Arc<Notifier>,
    ) -> Result<Self, UploadError> {
        let history = Arc::new(history);
        let executor = TransferExecutor::new(settings, clipboard, notifier.clone())?;
        tracing::info!(
            "Upload service ready: endpoint {}, history {:?} ({} entries)",
            executor.endpoint_url(),
            history.path(),
            history.count()
        );

        Ok(Self {
            batch: BatchUploader::new(executor, history.clone(), notifier, settings.batch_delay()),
            history,
            notify: settings.notifications_enabled,
        })
    }

    /// Build a service from the per-user settings and history files.
    ///
    /// Settings that cannot be loaded fall back to defaults so uploads still
    /// start.
    pub fn from_user_config() -> Result<Self, UploadError> {
        let settings = match SettingsStore::new() {
            Ok(store) => store.get(),
            Err(e) => {
                tracing::warn!("Settings unavailable, using defaults: {}", e);
                UploadSettings::default()
            }
        };
        Self::new(&settings, UploadHistory::new()?)
    }

    /// Upload a single file
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> BatchResult {
        self.upload_file_with(path, self.notify).await
    }

    pub async fn upload_file_with(&self, path: impl AsRef<Path>, notify: bool) -> BatchResult {
        let path = path.as_ref();
        self.batch
            .upload_many(&[path.to_path_buf()], notify)
            .await
            .pop()
            .unwrap_or_else(|| {
                BatchResult::failed(
                    display_name(path),
                    UploadError::Transfer("No result produced".to_string()).to_string(),
                )
            })
    }

    /// Upload files in order; one result per path, in input order
    pub async fn upload_many(&self, paths: &[PathBuf]) -> Vec<BatchResult> {
        self.batch.upload_many(paths, self.notify).await
    }

    pub async fn upload_many_with(&self, paths: &[PathBuf], notify: bool) -> Vec<BatchResult> {
        self.batch.upload_many(paths, notify).await
    }

    /// Upload every regular file below `dir`
    pub async fn upload_folder(&self, dir: impl AsRef<Path>) -> Vec<BatchResult> {
        self.batch.upload_folder(dir.as_ref(), self.notify).await
    }

    pub async fn upload_folder_with(
        &self,
        dir: impl AsRef<Path>,
        notify: bool,
    ) -> Vec<BatchResult> {
        self.batch.upload_folder(dir.as_ref(), notify).await
    }

    /// Most recent `limit` history records, newest first
    pub fn get_history(&self, limit: usize) -> Vec<UploadRecord> {
        self.history.list(limit)
    }

    pub fn history_count(&self) -> usize {
        self.history.count()
    }

    /// Wipe the history. Callers must have confirmed with the user.
    pub fn clear_history(&self) {
        match self.history.clear() {
            Ok(()) => tracing::info!("Upload history cleared"),
            Err(e) => tracing::warn!("Failed to persist cleared history: {}", e),
        }
    }
}
