// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Desktop notification adapter
//
// Best-effort: notify-send, then a zenity dialog, then stderr.
// Nothing here ever fails the caller.

use crate::types::{NotificationKind, UploadError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const APP_NAME: &str = "mros Upload Service";
const SUMMARY: &str = "File Upload";

/// Something that can show a notification to the user
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver the message; `false` means this mechanism did not show it
    async fn deliver(&self, message: &str, kind: NotificationKind) -> bool;
}

/// Run a notifier command to completion within `limit`
async fn run_bounded(program: &str, args: &[String], limit: Duration) -> Result<(), UploadError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => UploadError::SideEffect(format!("{} is not installed", program)),
            _ => UploadError::SideEffect(format!("Failed to start {}: {}", program, e)),
        })?;

    let status = tokio::time::timeout(limit, child.wait())
        .await
        .map_err(|_| UploadError::SideEffect(format!("{} timed out", program)))?
        .map_err(|e| UploadError::SideEffect(format!("{}: {}", program, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(UploadError::SideEffect(format!("{} exited with {}", program, status)))
    }
}

/// Native desktop notification through `notify-send`
pub struct NotifySend {
    timeout: Duration,
}

impl Default for NotifySend {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl NotificationProvider for NotifySend {
    fn name(&self) -> &str {
        "notify-send"
    }

    async fn deliver(&self, message: &str, kind: NotificationKind) -> bool {
        let args = vec![
            "-i".to_string(),
            kind.icon_name().to_string(),
            "-a".to_string(),
            APP_NAME.to_string(),
            SUMMARY.to_string(),
            message.to_string(),
        ];
        match run_bounded("notify-send", &args, self.timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("notify-send failed: {}", e);
                false
            }
        }
    }
}

/// Modal dialog through `zenity`
pub struct ZenityDialog {
    timeout: Duration,
}

impl Default for ZenityDialog {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl NotificationProvider for ZenityDialog {
    fn name(&self) -> &str {
        "zenity"
    }

    async fn deliver(&self, message: &str, _kind: NotificationKind) -> bool {
        let args = vec![
            "--info".to_string(),
            "--text".to_string(),
            format!("{}\n{}", SUMMARY, message),
            "--title".to_string(),
            APP_NAME.to_string(),
        ];
        match run_bounded("zenity", &args, self.timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("zenity failed: {}", e);
                false
            }
        }
    }
}

/// Notification front door with an ordered provider chain.
///
/// When no provider shows the message it is written to stderr.
pub struct Notifier {
    providers: Vec<Box<dyn NotificationProvider>>,
}

impl Notifier {
    pub fn new(providers: Vec<Box<dyn NotificationProvider>>) -> Self {
        Self { providers }
    }

    pub fn system() -> Self {
        Self::new(vec![
            Box::new(NotifySend::default()),
            Box::new(ZenityDialog::default()),
        ])
    }

    /// Show `message`; never fails
    pub async fn notify(&self, message: &str, kind: NotificationKind) {
        for provider in &self.providers {
            if provider.deliver(message, kind).await {
                tracing::debug!("Notification [{}] shown via {}", kind.name(), provider.name());
                return;
            }
        }
        eprintln!("NOTIFICATION: {}", message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::system()
    }
}
