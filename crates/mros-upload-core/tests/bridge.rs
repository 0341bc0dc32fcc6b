// SPDX-License-Identifier: AGPL-3.0
// Background bridge used by the GUI frontends

mod common;

use axum::http::StatusCode;
use common::{spawn_endpoint, unreachable_endpoint, Harness};
use mros_upload_core::{UploadBridge, UploadEvent};
use std::time::Duration;

fn next_event(bridge: &UploadBridge) -> UploadEvent {
    let rx = bridge.event_receiver();
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        if let Ok(event) = rx.try_recv() {
            return event;
        }
        assert!(std::time::Instant::now() < deadline, "no event from bridge");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_files_selected_reports_batch() {
    let h = Harness::new(&unreachable_endpoint());
    let missing = h.dir.path().join("gone.txt");
    let history_path = h.history_path.clone();
    let bridge = UploadBridge::new(h.reopen(&unreachable_endpoint())).unwrap();

    assert!(bridge.on_upload_files_selected(vec![missing]));

    match next_event(&bridge) {
        UploadEvent::BatchStarted { description } => {
            assert_eq!(description, "Uploading 1 files...")
        }
        other => panic!("unexpected event: {:?}", other),
    }
    match next_event(&bridge) {
        UploadEvent::BatchFinished { results, summary } => {
            assert_eq!(results.len(), 1);
            assert!(!results[0].success);
            assert_eq!(summary.failed, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    assert_eq!(bridge.history(50).len(), 1);
    assert_eq!(mros_upload_core::UploadHistory::load(&history_path).len(), 1);
}

#[test]
fn test_folder_selected_and_clear() {
    let h = Harness::new(&unreachable_endpoint());
    let empty = h.dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    let bridge = UploadBridge::new(h.reopen(&unreachable_endpoint())).unwrap();

    assert!(bridge.on_upload_folder_selected(empty));
    match next_event(&bridge) {
        UploadEvent::BatchStarted { description } => {
            assert_eq!(description, "Uploading folder: empty")
        }
        other => panic!("unexpected event: {:?}", other),
    }
    match next_event(&bridge) {
        UploadEvent::BatchFinished { results, .. } => assert!(results.is_empty()),
        other => panic!("unexpected event: {:?}", other),
    }

    assert!(bridge.clear_history());
    assert!(matches!(next_event(&bridge), UploadEvent::HistoryCleared));
    assert!(bridge.history(50).is_empty());
}

#[test]
fn test_empty_selection_is_ignored() {
    let h = Harness::new(&unreachable_endpoint());
    let bridge = UploadBridge::new(h.reopen(&unreachable_endpoint())).unwrap();

    assert!(!bridge.on_upload_files_selected(Vec::new()));
    std::thread::sleep(Duration::from_millis(100));

    assert!(bridge.event_receiver().try_recv().is_err());
}

#[test]
fn test_bridge_batches_send_no_notifications() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (endpoint, received) =
        runtime.block_on(spawn_endpoint(StatusCode::OK, "https://bashupload.com/ok"));
    let h = Harness::new(&endpoint);
    let a = h.file("a.txt", "first");
    let b = h.file("b.txt", "second");
    let folder = h.dir.path().join("share");
    h.file("share/c.txt", "third");
    let (service, notes) = h.reopen_recorded(&endpoint);
    let bridge = UploadBridge::new(service).unwrap();

    assert!(bridge.on_upload_files_selected(vec![a, b]));
    assert!(matches!(next_event(&bridge), UploadEvent::BatchStarted { .. }));
    match next_event(&bridge) {
        UploadEvent::BatchFinished { summary, .. } => assert!(summary.all_succeeded()),
        other => panic!("unexpected event: {:?}", other),
    }

    assert!(bridge.on_upload_folder_selected(folder));
    assert!(matches!(next_event(&bridge), UploadEvent::BatchStarted { .. }));
    match next_event(&bridge) {
        UploadEvent::BatchFinished { results, .. } => assert_eq!(results.len(), 1),
        other => panic!("unexpected event: {:?}", other),
    }

    // Status comes through events only; the desktop stays quiet
    assert_eq!(received.lock().unwrap().len(), 3);
    assert!(notes.lock().unwrap().is_empty());
}
