// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Clipboard adapter
//
// Copies text through the first clipboard mechanism that accepts it:
// xclip, xsel, wl-copy, then the in-process arboard clipboard.

use crate::types::UploadError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Upper bound for an external clipboard helper to take the text
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can place text on the clipboard
#[async_trait]
pub trait ClipboardProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Write `text`; `false` means this mechanism is unavailable or refused
    async fn write(&self, text: &str) -> bool;
}

/// External clipboard helper fed through stdin
pub struct CommandClipboard {
    program: &'static str,
    args: &'static [&'static str],
}

impl CommandClipboard {
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    async fn run(&self, text: &str) -> Result<(), UploadError> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    UploadError::SideEffect(format!("{} is not installed", self.program))
                }
                _ => UploadError::SideEffect(format!("Failed to start {}: {}", self.program, e)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| UploadError::SideEffect(format!("{}: {}", self.program, e)))?;
            // Close stdin so the helper sees EOF
            drop(stdin);
        }

        let status = tokio::time::timeout(COMMAND_TIMEOUT, child.wait())
            .await
            .map_err(|_| UploadError::SideEffect(format!("{} timed out", self.program)))?
            .map_err(|e| UploadError::SideEffect(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(UploadError::SideEffect(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

#[async_trait]
impl ClipboardProvider for CommandClipboard {
    fn name(&self) -> &str {
        self.program
    }

    async fn write(&self, text: &str) -> bool {
        match self.run(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Clipboard helper unavailable: {}", e);
                false
            }
        }
    }
}

/// In-process clipboard through the windowing system.
///
/// On X11 and Wayland the copied text is served by whoever owns the
/// selection, so the `arboard::Clipboard` is opened on first use and kept
/// for the lifetime of this provider instead of being dropped after a write.
#[derive(Default)]
pub struct ArboardClipboard {
    clipboard: Arc<Mutex<Option<arboard::Clipboard>>>,
}

impl ArboardClipboard {
    fn set_text(
        slot: &Mutex<Option<arboard::Clipboard>>,
        text: String,
    ) -> Result<(), UploadError> {
        let mut slot = slot
            .lock()
            .map_err(|_| UploadError::SideEffect("Clipboard lock poisoned".to_string()))?;
        let mut clipboard = match slot.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()
                .map_err(|e| UploadError::SideEffect(format!("No clipboard: {}", e)))?,
        };
        // A handle that refused text is dropped and reopened next time
        clipboard
            .set_text(text)
            .map_err(|e| UploadError::SideEffect(format!("Clipboard refused text: {}", e)))?;
        *slot = Some(clipboard);
        Ok(())
    }
}

#[async_trait]
impl ClipboardProvider for ArboardClipboard {
    fn name(&self) -> &str {
        "arboard"
    }

    async fn write(&self, text: &str) -> bool {
        let text = text.to_string();
        let slot = self.clipboard.clone();
        let result = tokio::task::spawn_blocking(move || Self::set_text(&slot, text)).await;

        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!("{}", e);
                false
            }
            Err(e) => {
                tracing::debug!("Clipboard task failed: {}", e);
                false
            }
        }
    }
}

/// Ordered fallback chain of clipboard providers
pub struct ClipboardChain {
    providers: Vec<Box<dyn ClipboardProvider>>,
}

impl ClipboardChain {
    pub fn new(providers: Vec<Box<dyn ClipboardProvider>>) -> Self {
        Self { providers }
    }

    /// X11, X11 alternate, Wayland, then in-process
    pub fn system() -> Self {
        Self::new(vec![
            Box::new(CommandClipboard::new("xclip", &["-selection", "clipboard"])),
            Box::new(CommandClipboard::new("xsel", &["--clipboard", "--input"])),
            Box::new(CommandClipboard::new("wl-copy", &[])),
            Box::new(ArboardClipboard::default()),
        ])
    }
}

impl Default for ClipboardChain {
    fn default() -> Self {
        Self::system()
    }
}

#[async_trait]
impl ClipboardProvider for ClipboardChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn write(&self, text: &str) -> bool {
        for provider in &self.providers {
            if provider.write(text).await {
                tracing::debug!("Copied to clipboard via {}", provider.name());
                return true;
            }
        }
        tracing::warn!("No clipboard mechanism accepted the text");
        false
    }
}
