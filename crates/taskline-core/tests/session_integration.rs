//! Integration tests for the producer side: session lifecycle, background
//! writer, task handles and the guarantees the log file carries.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use taskline_core::{
    CoreError, EventKind, ProgressEvent, Session, SessionError, SessionOptions, TaskStatus,
};

fn test_options() -> SessionOptions {
    SessionOptions {
        disabled: false,
        truncate: false,
        shutdown_timeout: Duration::from_secs(5),
    }
}

fn read_events(path: &std::path::Path) -> Vec<ProgressEvent> {
    let content = std::fs::read_to_string(path).unwrap();
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_scenario_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = session.task("Main", Some(100)).unwrap();
    for _ in 0..100 {
        task.update(1).unwrap();
    }
    drop(task); // normal scope exit
    session.close().unwrap();

    let events = read_events(&path);
    assert_eq!(events.len(), 102);
    assert_eq!(events[0].event, EventKind::Start);
    assert_eq!(events[0].name.as_deref(), Some("Main"));
    assert_eq!(events[0].total, Some(100));

    let last = events.last().unwrap();
    assert_eq!(last.event, EventKind::Finish);
    assert_eq!(last.progress, Some(100));
    assert_eq!(last.status, Some(TaskStatus::Succeeded));
}

#[test]
fn test_start_task_ids_unique() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let root = session.task("root", None).unwrap();
    for i in 0..100 {
        let child = root.child(format!("child {i}"), None).unwrap();
        child.complete().unwrap();
    }
    root.complete().unwrap();
    session.close().unwrap();

    let events = read_events(&path);
    let start_ids: Vec<_> = events
        .iter()
        .filter(|e| e.event == EventKind::Start)
        .map(|e| e.task_id.clone())
        .collect();
    assert_eq!(start_ids.len(), 101);
    let unique: HashSet<_> = start_ids.iter().collect();
    assert_eq!(unique.len(), start_ids.len());
}

#[test]
fn test_exactly_one_finish_per_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let explicit = session.task("explicit", None).unwrap();
    explicit.complete().unwrap();
    let dropped = session.task("dropped", None).unwrap();
    drop(dropped);
    session.close().unwrap();

    let events = read_events(&path);
    for id in events
        .iter()
        .filter(|e| e.event == EventKind::Start)
        .map(|e| &e.task_id)
    {
        let finishes = events
            .iter()
            .filter(|e| e.event == EventKind::Finish && &e.task_id == id)
            .count();
        assert_eq!(finishes, 1, "task {id} must finish exactly once");
    }
}

#[test]
fn test_start_precedes_updates_per_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let a = session.task("a", Some(3)).unwrap();
    let b = session.task("b", Some(3)).unwrap();
    // Interleave producers.
    for _ in 0..3 {
        a.update(1).unwrap();
        b.update(1).unwrap();
    }
    a.complete().unwrap();
    b.complete().unwrap();
    session.close().unwrap();

    let events = read_events(&path);
    for (i, event) in events.iter().enumerate() {
        if event.event != EventKind::Start {
            let start_pos = events
                .iter()
                .position(|e| e.event == EventKind::Start && e.task_id == event.task_id)
                .expect("every event belongs to a started task");
            assert!(start_pos < i, "start must precede event {i} of {}", event.task_id);
        }
    }
}

#[test]
fn test_child_failure_parent_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let parent = session.task("Main", None).unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let child = parent.child("Sub", None).unwrap();
        child.update(1).unwrap();
        panic!("boom");
    }));
    assert!(result.is_err());

    parent.complete().unwrap();
    session.close().unwrap();

    let events = read_events(&path);
    let id_for = |name: &str| {
        events
            .iter()
            .find(|e| e.event == EventKind::Start && e.name.as_deref() == Some(name))
            .map(|e| e.task_id.clone())
            .unwrap()
    };
    let status_for = |id: &str| {
        events
            .iter()
            .find(|e| e.event == EventKind::Finish && e.task_id == id)
            .and_then(|e| e.status)
            .unwrap()
    };

    assert_eq!(status_for(&id_for("Sub")), TaskStatus::Failed);
    assert_eq!(status_for(&id_for("Main")), TaskStatus::Succeeded);

    // The child's parent link survives onto the failure record.
    let sub_id = id_for("Sub");
    let sub_finish = events
        .iter()
        .find(|e| e.event == EventKind::Finish && e.task_id == sub_id)
        .unwrap();
    assert_eq!(sub_finish.parent_id.as_deref(), Some(id_for("Main").as_str()));
}

#[test]
fn test_explicit_fail_records_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = session.task("doomed", None).unwrap();
    task.update(7).unwrap();
    task.fail().unwrap();
    session.close().unwrap();

    let events = read_events(&path);
    let last = events.last().unwrap();
    assert_eq!(last.event, EventKind::Finish);
    assert_eq!(last.status, Some(TaskStatus::Failed));
    assert_eq!(last.progress, Some(7));
}

#[test]
fn test_disabled_session_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let options = SessionOptions {
        disabled: true,
        ..test_options()
    };
    let session = Session::open_with(&path, options).unwrap();
    assert!(session.is_disabled());

    // Full API surface still works.
    let task = session.task("Main", Some(10)).unwrap();
    task.update(3).unwrap();
    let child = task.child("Sub", None).unwrap();
    child.update_one().unwrap();
    child.complete().unwrap();
    assert_eq!(task.progress(), 3);
    task.complete().unwrap();
    session.close().unwrap();

    assert!(!path.exists());
}

#[test]
fn test_append_is_default_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    session.task("first run", None).unwrap().complete().unwrap();
    session.close().unwrap();

    let session = Session::open_with(&path, test_options()).unwrap();
    session.task("second run", None).unwrap().complete().unwrap();
    session.close().unwrap();

    let names: Vec<_> = read_events(&path)
        .into_iter()
        .filter_map(|e| e.name)
        .collect();
    assert_eq!(names, ["first run", "second run"]);
}

#[test]
fn test_truncate_option_discards_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    session.task("first run", None).unwrap().complete().unwrap();
    session.close().unwrap();

    let options = SessionOptions {
        truncate: true,
        ..test_options()
    };
    let session = Session::open_with(&path, options).unwrap();
    session.task("second run", None).unwrap().complete().unwrap();
    session.close().unwrap();

    let names: Vec<_> = read_events(&path)
        .into_iter()
        .filter_map(|e| e.name)
        .collect();
    assert_eq!(names, ["second run"]);
}

#[test]
fn test_close_drains_pending_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = session.task("burst", Some(500)).unwrap();
    for _ in 0..500 {
        task.update(1).unwrap();
    }
    task.complete().unwrap();
    // Close immediately: everything enqueued must still reach the file.
    session.close().unwrap();

    let events = read_events(&path);
    assert_eq!(events.len(), 502);
    assert_eq!(events.last().unwrap().progress, Some(500));
}

#[test]
fn test_writer_death_surfaces_on_next_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = session.task("orphaned handle", None).unwrap();
    session.close().unwrap();

    let err = task.update(1).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Session(SessionError::WriterDead)
    ));
}

#[test]
fn test_timestamps_non_decreasing_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = session.task("ticks", Some(50)).unwrap();
    for _ in 0..50 {
        task.update(1).unwrap();
    }
    task.complete().unwrap();
    session.close().unwrap();

    let events = read_events(&path);
    for pair in events.windows(2) {
        assert!(pair[0].ts <= pair[1].ts);
    }
}

#[test]
fn test_concurrent_producers_stay_monotonic_per_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    let task = std::sync::Arc::new(session.task("shared", Some(400)).unwrap());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let task = std::sync::Arc::clone(&task);
        handles.push(std::thread::spawn(move || {
            for _ in 0..100 {
                task.update(1).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(task.progress(), 400);
    drop(task);
    session.close().unwrap();

    // Absolute counts in the file never decrease.
    let mut last = 0;
    for event in read_events(&path) {
        if let Some(progress) = event.progress {
            assert!(progress >= last);
            last = progress;
        }
    }
    assert_eq!(last, 400);
}

#[test]
fn test_open_failure_is_fatal_at_open() {
    let dir = tempfile::tempdir().unwrap();
    // A directory at the target path makes the open fail.
    let path = dir.path().join("occupied");
    std::fs::create_dir(&path).unwrap();

    let err = Session::open_with(&path, test_options()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Session(SessionError::OpenFailed { .. })
    ));
}

#[test]
fn test_open_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("nested").join("run.progress.jsonl");

    let session = Session::open_with(&path, test_options()).unwrap();
    session.task("deep", None).unwrap().complete().unwrap();
    session.close().unwrap();

    assert!(path.exists());
    assert_eq!(read_events(&path).len(), 2);
}
