// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Single file transfer
//
// One multipart POST per file, no retries. Every failure is turned into a
// failed outcome; nothing escapes as an error.

use crate::clipboard::ClipboardProvider;
use crate::notify::Notifier;
use crate::settings::UploadSettings;
use crate::types::{BatchResult, NotificationKind, UploadError, UploadRecord};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Terminal result of one file's transfer attempt
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub filename: String,
    pub filepath: PathBuf,
    pub size: u64,
    pub mime_type: Option<String>,
    /// Seconds since the epoch when the attempt started
    pub started_at: f64,
    /// Download URL on success
    pub result: Result<String, UploadError>,
}

impl TransferOutcome {
    /// History entry for this outcome
    pub fn to_record(&self) -> UploadRecord {
        let filepath = self.filepath.to_string_lossy().to_string();
        match &self.result {
            Ok(url) => UploadRecord::completed(
                self.filename.clone(),
                filepath,
                self.size,
                self.mime_type.clone(),
                self.started_at,
                url.clone(),
            ),
            Err(e) => UploadRecord::failed(
                self.filename.clone(),
                filepath,
                self.size,
                self.mime_type.clone(),
                self.started_at,
                e.to_string(),
            ),
        }
    }

    /// Caller-facing result for this outcome
    pub fn to_batch_result(&self) -> BatchResult {
        match &self.result {
            Ok(url) => BatchResult::succeeded(self.filename.clone(), self.size, url.clone()),
            Err(e) => BatchResult::failed(self.filename.clone(), e.to_string()),
        }
    }
}

/// Display name for a path; `unknown` when it has none
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Pick the download URL out of the endpoint's response body.
///
/// A body that starts with a URL is taken verbatim, otherwise the first
/// URL-looking line is used. If the body has none, the URL is guessed as
/// `<endpoint>/<filename>`, which is a best-effort fallback and may not
/// resolve.
pub fn resolve_download_url(body: &str, endpoint_url: &str, filename: &str) -> String {
    fn is_url(s: &str) -> bool {
        s.starts_with("http://") || s.starts_with("https://")
    }

    let trimmed = body.trim();
    if is_url(trimmed) {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .map(str::trim)
        .find(|line| is_url(line))
        .map(|line| line.to_string())
        .unwrap_or_else(|| format!("{}/{}", endpoint_url.trim_end_matches('/'), filename))
}

fn classify_send_error(e: reqwest::Error) -> UploadError {
    if e.is_builder() {
        UploadError::Transfer(e.to_string())
    } else if e.is_timeout() {
        UploadError::Transport(format!("Request timed out: {}", e))
    } else {
        UploadError::Transport(e.to_string())
    }
}

/// Uploads single files to the hosting endpoint
pub struct TransferExecutor {
    http_client: Client,
    endpoint_url: String,
    auto_copy_url: bool,
    clipboard: Arc<dyn ClipboardProvider>,
    notifier: Arc<Notifier>,
}

impl TransferExecutor {
    pub fn new(
        settings: &UploadSettings,
        clipboard: Arc<dyn ClipboardProvider>,
        notifier: Arc<Notifier>,
    ) -> Result<Self, UploadError> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| UploadError::Transfer(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint_url: settings.endpoint_url.clone(),
            auto_copy_url: settings.auto_copy_url,
            clipboard,
            notifier,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Upload one file. `notify` controls start/success/error notifications.
    pub async fn transfer(&self, path: &Path, notify: bool) -> TransferOutcome {
        let filename = display_name(path);
        let mut outcome = TransferOutcome {
            filename: filename.clone(),
            filepath: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            size: 0,
            mime_type: None,
            started_at: now_secs(),
            result: Err(UploadError::Transfer("not started".to_string())),
        };

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                let error = UploadError::InvalidInput(format!("Not a file: {}", path.display()));
                return self.fail(outcome, error, notify).await;
            }
            Err(_) => {
                let error =
                    UploadError::InvalidInput(format!("File not found: {}", path.display()));
                return self.fail(outcome, error, notify).await;
            }
        };

        outcome.size = metadata.len();
        outcome.mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());

        if notify {
            self.notifier
                .notify(&format!("Uploading {}...", filename), NotificationKind::UploadStart)
                .await;
        }

        tracing::info!("Uploading {} ({} bytes) to {}", filename, outcome.size, self.endpoint_url);
        match self.send(path, &filename, outcome.size, outcome.mime_type.as_deref()).await {
            Ok(url) => {
                tracing::info!("Uploaded {}: {}", filename, url);
                self.finish(&url, notify).await;
                outcome.result = Ok(url);
                outcome
            }
            Err(e) => self.fail(outcome, e, notify).await,
        }
    }

    async fn send(
        &self,
        path: &Path,
        filename: &str,
        size: u64,
        mime_type: Option<&str>,
    ) -> Result<String, UploadError> {
        let file = File::open(path)
            .await
            .map_err(|e| UploadError::Transfer(format!("Failed to open file: {}", e)))?;

        // Stream the body instead of reading the whole file into memory
        let body = Body::wrap_stream(ReaderStream::new(file));
        let mut part = Part::stream_with_length(body, size).file_name(filename.to_string());
        if let Some(mime_type) = mime_type {
            part = part
                .mime_str(mime_type)
                .map_err(|e| UploadError::Transfer(format!("Invalid MIME type: {}", e)))?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UploadError::Remote {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(format!("Failed to read response: {}", e)))?;

        Ok(resolve_download_url(&body, &self.endpoint_url, filename))
    }

    async fn finish(&self, url: &str, notify: bool) {
        let copied = self.auto_copy_url && self.clipboard.write(url).await;
        if self.auto_copy_url && !copied {
            tracing::warn!("Could not copy {} to the clipboard", url);
        }

        if notify {
            let message = if copied {
                format!("Upload complete! URL copied to clipboard\n{}", url)
            } else {
                format!("Upload complete!\n{}", url)
            };
            self.notifier.notify(&message, NotificationKind::UploadSuccess).await;
        }
    }

    async fn fail(
        &self,
        mut outcome: TransferOutcome,
        error: UploadError,
        notify: bool,
    ) -> TransferOutcome {
        tracing::warn!("Upload of {} failed: {}", outcome.filename, error);
        if notify {
            self.notifier
                .notify(&format!("Upload failed: {}", error), NotificationKind::UploadError)
                .await;
        }
        outcome.result = Err(error);
        outcome
    }
}
