//! Progress session: sidecar file lifetime, event queue, writer thread.
//!
//! A [`Session`] owns the append-only JSONL sidecar for one run. Task
//! handles enqueue events into an unbounded channel; a single background
//! thread drains it and appends one JSON line per event, so producer calls
//! never touch the file. Closing the session (explicitly or on drop) drains
//! the queue, flushes and joins the writer.

mod writer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::warn;

use crate::error::{Result, SessionError};
use crate::events::ProgressEvent;
use crate::task::Task;
use writer::WriterMsg;

/// Environment variable that disables progress logging process-wide.
/// Only the exact value `"1"` disables; absence or any other value enables.
pub const DISABLE_ENV: &str = "TASKLINE_DISABLED";

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Options for [`Session::open_with`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// When true, the session creates no file, no queue and no thread; all
    /// task operations are no-ops that still return valid handles.
    pub disabled: bool,
    /// Truncate the sidecar instead of appending. Appending is the default:
    /// JSONL logs are meant to survive restarts.
    pub truncate: bool,
    /// How long `close` waits for the writer to drain and acknowledge.
    pub shutdown_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            disabled: env_disabled(std::env::var(DISABLE_ENV).ok().as_deref()),
            truncate: false,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

fn env_disabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Producer-side endpoint shared by every task handle of a session.
///
/// Holds the channel sender and the writer liveness flag; emitting checks
/// both so a dead writer surfaces on the next producer call instead of
/// silently swallowing events.
#[derive(Debug)]
pub(crate) struct Backend {
    tx: Sender<WriterMsg>,
    alive: Arc<AtomicBool>,
}

impl Backend {
    pub(crate) fn emit(&self, event: ProgressEvent) -> Result<(), SessionError> {
        if !self.alive.load(Ordering::Acquire) {
            return Err(SessionError::WriterDead);
        }
        self.tx
            .send(WriterMsg::Event(event))
            .map_err(|_| SessionError::WriterDead)
    }
}

/// Process entry point for progress logging.
///
/// ```no_run
/// use taskline_core::Session;
///
/// # fn main() -> taskline_core::Result<()> {
/// let session = Session::open("run.progress.jsonl")?;
/// let task = session.task("experiments", Some(60))?;
/// for _ in 0..60 {
///     let run = task.child("experiment", None)?;
///     run.update(1)?;
///     run.complete()?;
/// }
/// task.complete()?;
/// session.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    backend: Option<Arc<Backend>>,
    writer: Option<JoinHandle<()>>,
    done_rx: Option<Receiver<()>>,
    shutdown_timeout: Duration,
    path: PathBuf,
}

impl Session {
    /// Open a session with default options (append mode; disabled when
    /// `TASKLINE_DISABLED=1` is set in the environment).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SessionOptions::default())
    }

    /// Open a session with explicit options.
    ///
    /// Creates parent directories as needed and starts exactly one writer
    /// thread. File errors surface here as [`SessionError::OpenFailed`];
    /// they are fatal for the session.
    pub fn open_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if options.disabled {
            return Ok(Self {
                backend: None,
                writer: None,
                done_rx: None,
                shutdown_timeout: options.shutdown_timeout,
                path,
            });
        }

        let open_failed = |source| SessionError::OpenFailed {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(open_failed)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(!options.truncate)
            .write(true)
            .truncate(options.truncate)
            .open(&path)
            .map_err(open_failed)?;

        let (tx, rx) = unbounded();
        let (done_tx, done_rx) = bounded(1);
        let alive = Arc::new(AtomicBool::new(true));
        let writer = writer::spawn(file, rx, Arc::clone(&alive), done_tx)
            .map_err(open_failed)?;

        Ok(Self {
            backend: Some(Arc::new(Backend { tx, alive })),
            writer: Some(writer),
            done_rx: Some(done_rx),
            shutdown_timeout: options.shutdown_timeout,
            path,
        })
    }

    /// Path of the sidecar file this session writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this session is a no-op.
    pub fn is_disabled(&self) -> bool {
        self.backend.is_none()
    }

    /// Create a root task. Enqueues its `start` event synchronously, so the
    /// record precedes any of the task's updates in the file.
    pub fn task(&self, name: impl Into<String>, total: Option<u64>) -> Result<Task> {
        Task::create(self.backend.clone(), name.into(), total, None)
    }

    /// Drain the queue, flush, close the file and join the writer.
    ///
    /// Also runs on drop; calling it explicitly surfaces drain problems
    /// ([`SessionError::ShutdownTimeout`]) instead of logging them.
    pub fn close(mut self) -> Result<()> {
        self.shutdown().map_err(Into::into)
    }

    fn shutdown(&mut self) -> Result<(), SessionError> {
        let Some(backend) = self.backend.take() else {
            return Ok(());
        };
        // FIFO: the sentinel lands behind every already-enqueued event, so
        // the writer drains them all before acknowledging.
        let _ = backend.tx.send(WriterMsg::Shutdown);
        drop(backend);

        if let Some(done_rx) = self.done_rx.take() {
            if done_rx.recv_timeout(self.shutdown_timeout).is_err() {
                // Leave the thread detached rather than blocking forever.
                self.writer.take();
                return Err(SessionError::ShutdownTimeout {
                    timeout_ms: self.shutdown_timeout.as_millis() as u64,
                });
            }
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(path = %self.path.display(), "progress session shutdown: {e}");
        }
    }
}
