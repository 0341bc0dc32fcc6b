// SPDX-License-Identifier: AGPL-3.0
// mros Upload Core - Upload history persistence
//
// Stores terminal upload records in a local JSON file, most recent first.
// The file is shared by every shell process that uploads; writers are not
// coordinated across processes, so concurrent appends may lose entries.

use crate::settings::config_dir;
use crate::types::{UploadError, UploadRecord};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Maximum number of history entries to keep
pub const MAX_HISTORY_ENTRIES: usize = 100;

const HISTORY_FILE_NAME: &str = "upload_history.json";

/// File-based upload history storage
pub struct UploadHistory {
    records: RwLock<Vec<UploadRecord>>,
    file_path: PathBuf,
}

impl UploadHistory {
    /// Open the history file in the per-user config directory
    pub fn new() -> Result<Self, UploadError> {
        Ok(Self::with_path(config_dir()?.join(HISTORY_FILE_NAME)))
    }

    /// Open a history store backed by `file_path`, loading it once
    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let records = Self::load(&file_path);
        tracing::debug!("Loaded {} history records from {:?}", records.len(), file_path);

        Self {
            records: RwLock::new(records),
            file_path,
        }
    }

    /// Read a history file.
    ///
    /// A missing or unreadable file yields an empty history; a corrupt
    /// history must never block uploading.
    pub fn load(file_path: &Path) -> Vec<UploadRecord> {
        if !file_path.exists() {
            return Vec::new();
        }

        let content = match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read history, starting fresh: {}", e);
                return Vec::new();
            }
        };

        let mut records: Vec<UploadRecord> = serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse history, starting fresh: {}", e);
            Vec::new()
        });
        records.retain(|r| r.status.is_terminal());
        records.truncate(MAX_HISTORY_ENTRIES);
        records
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<UploadRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<UploadRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist the full history through a temp file in the same directory
    /// followed by a rename, so a crash never leaves a half-written file.
    fn persist(&self) -> Result<(), UploadError> {
        let content = serde_json::to_string_pretty(&*self.read()).map_err(|e| {
            UploadError::Persistence(format!("Failed to serialize history: {}", e))
        })?;

        let dir = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| UploadError::Persistence(format!("Failed to create history dir: {}", e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| UploadError::Persistence(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| UploadError::Persistence(format!("Failed to write history: {}", e)))?;
        tmp.persist(&self.file_path).map_err(|e| {
            UploadError::Persistence(format!("Failed to replace history: {}", e.error))
        })?;

        Ok(())
    }

    /// Get up to `limit` records, most recent first
    pub fn list(&self, limit: usize) -> Vec<UploadRecord> {
        self.read().iter().take(limit).cloned().collect()
    }

    /// Add a terminal record at the front and persist
    pub fn add(&self, record: UploadRecord) -> Result<(), UploadError> {
        if !record.status.is_terminal() {
            return Err(UploadError::InvalidInput(format!(
                "Refusing to store in-flight record for {}",
                record.filename
            )));
        }

        {
            let mut records = self.write();

            // Add new record at the beginning (most recent first)
            records.insert(0, record);

            // Trim to max entries
            records.truncate(MAX_HISTORY_ENTRIES);
        }

        self.persist()
    }

    /// Clear all history. Irreversible; callers confirm with the user first.
    pub fn clear(&self) -> Result<(), UploadError> {
        self.write().clear();
        self.persist()
    }

    /// Get the count of history entries
    pub fn count(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UploadStatus;

    fn record(n: usize) -> UploadRecord {
        UploadRecord::completed(
            format!("file-{n}.txt"),
            format!("/tmp/file-{n}.txt"),
            n as u64,
            Some("text/plain".to_string()),
            1_700_000_000.0 + n as f64,
            format!("https://bashupload.com/{n}"),
        )
    }

    #[test]
    fn test_max_history_constant() {
        assert_eq!(MAX_HISTORY_ENTRIES, 100);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = UploadHistory::with_path(dir.path().join("upload_history.json"));
        assert_eq!(history.count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload_history.json");
        fs::write(&path, "[{\"filename\": ").unwrap();

        let history = UploadHistory::with_path(&path);
        assert!(history.list(50).is_empty());

        // Still writable afterwards
        history.add(record(1)).unwrap();
        assert_eq!(UploadHistory::load(&path).len(), 1);
    }

    #[test]
    fn test_add_is_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = UploadHistory::with_path(dir.path().join("h.json"));
        history.add(record(1)).unwrap();
        history.add(record(2)).unwrap();

        let names: Vec<_> = history.list(10).into_iter().map(|r| r.filename).collect();
        assert_eq!(names, vec!["file-2.txt", "file-1.txt"]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let history = UploadHistory::with_path(&path);
        for n in 0..MAX_HISTORY_ENTRIES {
            history.add(record(n)).unwrap();
        }
        assert_eq!(history.count(), MAX_HISTORY_ENTRIES);

        history.add(record(MAX_HISTORY_ENTRIES)).unwrap();
        let all = history.list(usize::MAX);
        assert_eq!(all.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(all[0].filename, format!("file-{}.txt", MAX_HISTORY_ENTRIES));
        assert!(all.iter().all(|r| r.filename != "file-0.txt"));
        assert_eq!(all.last().unwrap().filename, "file-1.txt");
        assert_eq!(UploadHistory::load(&path).len(), MAX_HISTORY_ENTRIES);
    }

    #[test]
    fn test_round_trip_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let history = UploadHistory::with_path(&path);
        history.add(record(1)).unwrap();
        history
            .add(UploadRecord::failed(
                "bad.bin".into(),
                "/tmp/bad.bin".into(),
                0,
                None,
                1_700_000_100.25,
                "Upload failed: HTTP 500".into(),
            ))
            .unwrap();

        let first = UploadHistory::load(&path);
        let reopened = UploadHistory::with_path(&path);
        reopened.persist().unwrap();
        let second = UploadHistory::load(&path);

        assert_eq!(first, second);
        assert_eq!(first, history.list(usize::MAX));
    }

    #[test]
    fn test_clear_persists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let history = UploadHistory::with_path(&path);
        history.add(record(1)).unwrap();
        history.clear().unwrap();

        assert!(history.list(50).is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_in_flight_record_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let history = UploadHistory::with_path(dir.path().join("h.json"));
        let mut in_flight = record(1);
        in_flight.status = UploadStatus::Uploading;

        assert!(matches!(
            history.add(in_flight),
            Err(UploadError::InvalidInput(_))
        ));
        assert_eq!(history.count(), 0);
    }

    #[test]
    fn test_reads_shell_history_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(
            &path,
            r#"[
  {
    "filename": "notes.txt",
    "filepath": "/home/u/notes.txt",
    "size": 12,
    "mime_type": null,
    "timestamp": 1712345678.123,
    "status": "completed",
    "download_url": "https://bashupload.com/x/notes.txt",
    "upload_id": "deadbeef"
  }
]"#,
        )
        .unwrap();

        let records = UploadHistory::load(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].upload_id.as_deref(), Some("deadbeef"));
        assert_eq!(records[0].mime_type, None);
    }
}
