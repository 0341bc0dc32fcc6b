// SPDX-License-Identifier: AGPL-3.0
// Shared fixtures: a local mock upload endpoint and recording side effects

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use mros_upload_core::{
    ClipboardProvider, NotificationKind, NotificationProvider, Notifier, UploadHistory,
    UploadService, UploadSettings,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One multipart field seen by the mock endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub len: usize,
}

pub type Received = Arc<Mutex<Vec<ReceivedField>>>;

/// Start an endpoint answering every POST with `status` and `body`
pub async fn spawn_endpoint(status: StatusCode, body: &'static str) -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let seen = received.clone();

    let app = Router::new().route(
        "/",
        post(move |mut multipart: Multipart| {
            let seen = seen.clone();
            async move {
                while let Ok(Some(field)) = multipart.next_field().await {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().map(str::to_string);
                    let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                    seen.lock().unwrap().push(ReceivedField {
                        name,
                        file_name,
                        len,
                    });
                }
                (status, body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

/// An address nothing listens on
pub fn unreachable_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub type Notes = Arc<Mutex<Vec<(String, NotificationKind)>>>;
pub type Copied = Arc<Mutex<Vec<String>>>;

struct RecordingNotifier(Notes);

#[async_trait]
impl NotificationProvider for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, message: &str, kind: NotificationKind) -> bool {
        self.0.lock().unwrap().push((message.to_string(), kind));
        true
    }
}

struct RecordingClipboard(Copied);

#[async_trait]
impl ClipboardProvider for RecordingClipboard {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write(&self, text: &str) -> bool {
        self.0.lock().unwrap().push(text.to_string());
        true
    }
}

pub struct Harness {
    pub service: UploadService,
    pub notes: Notes,
    pub copied: Copied,
    pub history_path: PathBuf,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(endpoint: &str) -> Self {
        Self::with_settings(Self::settings(endpoint))
    }

    pub fn with_settings(settings: UploadSettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("upload_history.json");
        let (service, notes, copied) = Self::build(&settings, &history_path);

        Self {
            service,
            notes,
            copied,
            history_path,
            dir,
        }
    }

    pub fn settings(endpoint: &str) -> UploadSettings {
        UploadSettings {
            endpoint_url: endpoint.to_string(),
            timeout_secs: 10,
            batch_delay_ms: 0,
            auto_copy_url: true,
            notifications_enabled: true,
        }
    }

    fn build(settings: &UploadSettings, history_path: &Path) -> (UploadService, Notes, Copied) {
        let notes: Notes = Arc::new(Mutex::new(Vec::new()));
        let copied: Copied = Arc::new(Mutex::new(Vec::new()));
        let service = UploadService::with_side_effects(
            settings,
            UploadHistory::with_path(history_path),
            Arc::new(RecordingClipboard(copied.clone())),
            Arc::new(Notifier::new(vec![Box::new(RecordingNotifier(notes.clone()))])),
        )
        .unwrap();
        (service, notes, copied)
    }

    /// A second service instance over the same history file
    pub fn reopen(&self, endpoint: &str) -> UploadService {
        self.reopen_recorded(endpoint).0
    }

    /// Like `reopen`, keeping the new instance's notification log
    pub fn reopen_recorded(&self, endpoint: &str) -> (UploadService, Notes) {
        let (service, notes, _) = Self::build(&Self::settings(endpoint), &self.history_path);
        (service, notes)
    }

    /// Write a file under the harness directory
    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notes.lock().unwrap().iter().map(|(_, k)| *k).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notes.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}
