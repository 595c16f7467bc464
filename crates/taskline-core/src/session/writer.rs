//! Background writer thread.
//!
//! Single consumer of the session queue. Dequeues in FIFO order and appends
//! one JSON line per event. The thread must never die silently: every exit
//! path clears the shared liveness flag (including panic unwinding, via a
//! drop guard), which producers check on their next call.

use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::error;

use crate::events::ProgressEvent;

pub(crate) enum WriterMsg {
    Event(ProgressEvent),
    Shutdown,
}

/// Clears the liveness flag when the writer exits, however it exits.
struct LivenessGuard(Arc<AtomicBool>);

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) fn spawn(
    file: File,
    rx: Receiver<WriterMsg>,
    alive: Arc<AtomicBool>,
    done_tx: Sender<()>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("taskline-writer".into())
        .spawn(move || run(file, rx, alive, done_tx))
}

fn run(mut file: File, rx: Receiver<WriterMsg>, alive: Arc<AtomicBool>, done_tx: Sender<()>) {
    let _guard = LivenessGuard(alive);

    // Ends on the shutdown sentinel or when every sender is gone.
    for msg in rx.iter() {
        match msg {
            WriterMsg::Event(event) => write_event(&mut file, &event),
            WriterMsg::Shutdown => break,
        }
    }

    if let Err(e) = file.flush() {
        error!("progress writer flush failed: {e}");
    }
    let _ = done_tx.send(());
}

/// Serialize and append one event. A failure drops the event with a
/// diagnostic; the writer keeps running so later events still land.
fn write_event(file: &mut File, event: &ProgressEvent) {
    let mut line = match serde_json::to_string(event) {
        Ok(line) => line,
        Err(e) => {
            error!(task_id = %event.task_id, "dropping unserializable progress event: {e}");
            return;
        }
    };
    line.push('\n');
    // One write call per line keeps lines whole for concurrent tailers.
    if let Err(e) = file.write_all(line.as_bytes()) {
        error!(task_id = %event.task_id, "dropping progress event, write failed: {e}");
    }
}
