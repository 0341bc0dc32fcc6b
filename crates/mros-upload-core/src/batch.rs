// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Batch uploads
//
// Files are uploaded strictly one after another, in the order given, with a
// short pause between them. One failure never stops the rest of the batch.

use crate::history::UploadHistory;
use crate::notify::Notifier;
use crate::transfer::{display_name, TransferExecutor};
use crate::types::{BatchResult, BatchSummary, NotificationKind, UploadError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Every regular file below `dir`, in file-name order at each level.
///
/// Symlinks are followed; entries the walker cannot read (including symlink
/// loops) are skipped.
pub fn collect_folder_files(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    if !dir.is_dir() {
        return Err(UploadError::InvalidInput(format!(
            "Invalid folder: {}",
            dir.display()
        )));
    }

    let files = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    Ok(files)
}

/// Sequences transfers and records every outcome in history
pub struct BatchUploader {
    executor: TransferExecutor,
    history: Arc<UploadHistory>,
    notifier: Arc<Notifier>,
    delay: Duration,
}

impl BatchUploader {
    pub fn new(
        executor: TransferExecutor,
        history: Arc<UploadHistory>,
        notifier: Arc<Notifier>,
        delay: Duration,
    ) -> Self {
        Self {
            executor,
            history,
            notifier,
            delay,
        }
    }

    /// Upload `paths` in order and return one result per path
    pub async fn upload_many(&self, paths: &[PathBuf], notify: bool) -> Vec<BatchResult> {
        let total = paths.len();
        let multi = total > 1;
        let mut results = Vec::with_capacity(total);

        if notify && multi {
            let message = format!("Starting upload of {} files...", total);
            self.notifier.notify(&message, NotificationKind::UploadStart).await;
        }
        tracing::info!("Starting batch of {} file(s)", total);

        for (index, path) in paths.iter().enumerate() {
            if notify && multi {
                self.notifier
                    .notify(
                        &format!("Uploading file {}/{}: {}", index + 1, total, display_name(path)),
                        NotificationKind::UploadProgress,
                    )
                    .await;
            }

            // Single-file batches let the executor signal progress itself
            let outcome = self.executor.transfer(path, notify && !multi).await;

            if let Err(e) = self.history.add(outcome.to_record()) {
                tracing::warn!("Failed to record upload of {}: {}", outcome.filename, e);
            }
            results.push(outcome.to_batch_result());

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            summary.successful,
            summary.failed
        );

        if notify && multi {
            if summary.all_succeeded() {
                self.notifier
                    .notify(
                        &format!("All {} files uploaded successfully!", total),
                        NotificationKind::UploadSuccess,
                    )
                    .await;
            } else {
                let message =
                    format!("{} files uploaded, {} failed", summary.successful, summary.failed);
                self.notifier.notify(&message, NotificationKind::UploadWarning).await;
            }
        }

        results
    }

    /// Upload every regular file below `dir`, recursively
    pub async fn upload_folder(&self, dir: &Path, notify: bool) -> Vec<BatchResult> {
        let files = match collect_folder_files(dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Folder upload rejected: {}", e);
                if notify {
                    let message = format!("Folder upload error: {}", e);
                    self.notifier.notify(&message, NotificationKind::UploadError).await;
                }
                return vec![BatchResult::failed(display_name(dir), e.to_string())];
            }
        };

        if files.is_empty() {
            tracing::warn!("No files found in {}", dir.display());
            if notify {
                self.notifier
                    .notify("No files found in folder", NotificationKind::UploadWarning)
                    .await;
            }
            return Vec::new();
        }

        self.upload_many(&files, notify).await
    }
}
