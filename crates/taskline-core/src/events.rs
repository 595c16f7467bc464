//! Progress event wire format.
//!
//! Every task lifecycle transition is serialized as exactly one JSON object
//! on one line of the sidecar file. Field names and enum string values are
//! part of the on-disk contract: any reader tailing the same file matches on
//! them byte for byte, so they must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle transition carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Update,
    Finish,
}

/// Task status as tracked by readers and carried on `finish` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Observed in the log but no `start` record yet. Reader-side only,
    /// never written by a producer.
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Whether this status ends the task's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// One record of the append-only progress log.
///
/// `start` carries `name` (and `total` when known), `update` and `finish`
/// carry the absolute `progress` count, `finish` additionally carries the
/// terminal `status`. `parent_id` is fixed at task creation and repeated on
/// every event for that task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Wall-clock time as epoch milliseconds. Non-decreasing within a single
    /// writer process.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub event: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Absolute progress count, not a delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl ProgressEvent {
    /// Record announcing a newly created task.
    pub fn start(
        task_id: String,
        parent_id: Option<String>,
        name: String,
        total: Option<u64>,
    ) -> Self {
        Self {
            ts: Utc::now(),
            task_id,
            parent_id,
            event: EventKind::Start,
            name: Some(name),
            total,
            progress: None,
            status: None,
        }
    }

    /// Record carrying a task's new absolute progress count.
    pub fn update(task_id: String, parent_id: Option<String>, progress: u64) -> Self {
        Self {
            ts: Utc::now(),
            task_id,
            parent_id,
            event: EventKind::Update,
            name: None,
            total: None,
            progress: Some(progress),
            status: None,
        }
    }

    /// Terminal record. `status` must be `Succeeded` or `Failed`.
    pub fn finish(
        task_id: String,
        parent_id: Option<String>,
        progress: u64,
        status: TaskStatus,
    ) -> Self {
        Self {
            ts: Utc::now(),
            task_id,
            parent_id,
            event: EventKind::Finish,
            name: None,
            total: None,
            progress: Some(progress),
            status: Some(status),
        }
    }
}
