// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - GUI bridge
//
// Runs uploads off the GUI thread. Selections from file dialogs are queued
// and processed one batch at a time on a background runtime; completion is
// reported through an event channel the GUI polls from its main loop.
// Batches run without desktop notifications: the GUI shows status text
// from the events instead.

use crate::service::UploadService;
use crate::types::{BatchResult, BatchSummary, UploadError, UploadRecord};
use async_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Commands queued by the GUI
#[derive(Debug)]
pub enum UploadCommand {
    UploadFiles { paths: Vec<PathBuf> },
    UploadFolder { dir: PathBuf },
    ClearHistory,
}

/// Events reported back to the GUI
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A batch left the queue; `description` is status bar text
    BatchStarted { description: String },
    BatchFinished {
        results: Vec<BatchResult>,
        summary: BatchSummary,
    },
    HistoryCleared,
}

/// Bridge between a GUI main loop and the upload service
pub struct UploadBridge {
    command_tx: Sender<UploadCommand>,
    event_rx: Receiver<UploadEvent>,
    service: Arc<UploadService>,
    _runtime: Arc<Runtime>,
}

impl UploadBridge {
    pub fn new(service: UploadService) -> Result<Self, UploadError> {
        let (command_tx, command_rx) = async_channel::unbounded::<UploadCommand>();
        let (event_tx, event_rx) = async_channel::bounded::<UploadEvent>(64);
        let service = Arc::new(service);

        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .map_err(|e| UploadError::Transfer(format!("Failed to create runtime: {}", e)))?,
        );

        runtime.spawn(Self::run_queue(service.clone(), command_rx, event_tx));

        Ok(Self {
            command_tx,
            event_rx,
            service,
            _runtime: runtime,
        })
    }

    async fn run_queue(
        service: Arc<UploadService>,
        command_rx: Receiver<UploadCommand>,
        event_tx: Sender<UploadEvent>,
    ) {
        // One command at a time keeps batches on this service serialised
        while let Ok(command) = command_rx.recv().await {
            let event = match command {
                UploadCommand::UploadFiles { paths } => {
                    let description = format!("Uploading {} files...", paths.len());
                    if event_tx.send(UploadEvent::BatchStarted { description }).await.is_err() {
                        break;
                    }
                    let results = service.upload_many_with(&paths, false).await;
                    Self::finished(results)
                }
                UploadCommand::UploadFolder { dir } => {
                    let description = format!(
                        "Uploading folder: {}",
                        dir.file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| dir.display().to_string())
                    );
                    if event_tx.send(UploadEvent::BatchStarted { description }).await.is_err() {
                        break;
                    }
                    let results = service.upload_folder_with(&dir, false).await;
                    Self::finished(results)
                }
                UploadCommand::ClearHistory => {
                    service.clear_history();
                    UploadEvent::HistoryCleared
                }
            };

            if event_tx.send(event).await.is_err() {
                break; // GUI went away
            }
        }
        tracing::debug!("Upload queue stopped");
    }

    fn finished(results: Vec<BatchResult>) -> UploadEvent {
        let summary = BatchSummary::from_results(&results);
        tracing::info!("{}", summary.status_message());
        UploadEvent::BatchFinished { results, summary }
    }

    /// Queue a command; `false` when the background queue has stopped
    fn enqueue(&self, command: UploadCommand) -> bool {
        match self.command_tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Upload queue rejected command: {}", e);
                false
            }
        }
    }

    /// Files picked in a dialog. Returns whether a batch was queued.
    pub fn on_upload_files_selected(&self, paths: Vec<PathBuf>) -> bool {
        if paths.is_empty() {
            return false;
        }
        self.enqueue(UploadCommand::UploadFiles { paths })
    }

    /// Folder picked in a dialog. Returns whether a batch was queued.
    pub fn on_upload_folder_selected(&self, dir: PathBuf) -> bool {
        self.enqueue(UploadCommand::UploadFolder { dir })
    }

    /// Queue a history wipe; the GUI asks for confirmation first
    pub fn clear_history(&self) -> bool {
        self.enqueue(UploadCommand::ClearHistory)
    }

    /// Read history directly, even while a batch is running
    pub fn history(&self, limit: usize) -> Vec<UploadRecord> {
        self.service.get_history(limit)
    }

    /// Get event receiver for subscribing to upload events
    pub fn event_receiver(&self) -> Receiver<UploadEvent> {
        self.event_rx.clone()
    }
}
