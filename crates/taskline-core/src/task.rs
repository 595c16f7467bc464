//! Task handles: the unit of the public producer API.
//!
//! A [`Task`] represents one live task from creation to its terminal event.
//! Every operation enqueues exactly one event into the session queue and
//! never performs file I/O itself.
//!
//! Finishing is guaranteed: call [`Task::complete`] or [`Task::fail`]
//! explicitly, or let the handle drop: the drop emits the terminal event,
//! recording `failed` when the thread is unwinding from a panic and
//! `succeeded` otherwise. Whichever happens first wins; a task emits its
//! `finish` exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::events::{ProgressEvent, TaskStatus};
use crate::session::Backend;

/// Handle for one task instance. Safe to share across threads; progress
/// counting and event emission happen under one lock so the absolute counts
/// written to the log never decrease.
pub struct Task {
    backend: Option<Arc<Backend>>,
    id: String,
    parent_id: Option<String>,
    name: String,
    total: Option<u64>,
    progress: Mutex<u64>,
    finished: AtomicBool,
}

impl Task {
    pub(crate) fn create(
        backend: Option<Arc<Backend>>,
        name: String,
        total: Option<u64>,
        parent_id: Option<String>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if total == Some(0) {
            return Err(ValidationError::ZeroTotal.into());
        }

        let task = Self {
            backend,
            id: short_id(),
            parent_id,
            name,
            total,
            progress: Mutex::new(0),
            finished: AtomicBool::new(false),
        };
        task.emit(ProgressEvent::start(
            task.id.clone(),
            task.parent_id.clone(),
            task.name.clone(),
            task.total,
        ))?;
        Ok(task)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Current progress count.
    pub fn progress(&self) -> u64 {
        *self.lock_progress()
    }

    /// Advance progress by `n` units and emit the new absolute count.
    ///
    /// The count saturates at `u64::MAX`. Emitted values never decrease;
    /// a shrinking delta cannot be expressed.
    pub fn update(&self, n: u64) -> Result<()> {
        let mut progress = self.lock_progress();
        *progress = progress.saturating_add(n);
        self.emit(ProgressEvent::update(
            self.id.clone(),
            self.parent_id.clone(),
            *progress,
        ))
    }

    /// Advance progress by one unit.
    pub fn update_one(&self) -> Result<()> {
        self.update(1)
    }

    /// Create a nested task whose parent is this task. Does not change this
    /// task's own progress.
    pub fn child(&self, name: impl Into<String>, total: Option<u64>) -> Result<Task> {
        Task::create(
            self.backend.clone(),
            name.into(),
            total,
            Some(self.id.clone()),
        )
    }

    /// Finish with status `succeeded`.
    pub fn complete(self) -> Result<()> {
        self.finish(TaskStatus::Succeeded)
    }

    /// Finish with status `failed`.
    pub fn fail(self) -> Result<()> {
        self.finish(TaskStatus::Failed)
    }

    fn finish(&self, status: TaskStatus) -> Result<()> {
        if self.finished.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let progress = *self.lock_progress();
        self.emit(ProgressEvent::finish(
            self.id.clone(),
            self.parent_id.clone(),
            progress,
            status,
        ))
    }

    fn emit(&self, event: ProgressEvent) -> Result<()> {
        match &self.backend {
            Some(backend) => backend.emit(event).map_err(Into::into),
            None => Ok(()),
        }
    }

    fn lock_progress(&self) -> std::sync::MutexGuard<'_, u64> {
        // A poisoned lock only means another thread panicked mid-update;
        // the counter itself is still valid.
        self.progress
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        let status = if std::thread::panicking() {
            TaskStatus::Failed
        } else {
            TaskStatus::Succeeded
        };
        if let Err(e) = self.finish(status) {
            warn!(task_id = %self.id, "could not record task finish: {e}");
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("name", &self.name)
            .field("total", &self.total)
            .field("progress", &self.progress())
            .finish()
    }
}

/// 8-hex-char task id, unique within a process run.
fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
