//! Incremental log reading (tailing) and tree reconstruction.
//!
//! The reader is fully independent of the writer: it shares nothing but the
//! append-only file. Each [`LogReader::poll`] picks up where the last one
//! left off and consumes only newline-terminated lines, so a partially
//! written final line is simply retried on the next pass instead of being
//! treated as corruption.

mod tree;

pub use tree::{TaskNode, TaskTree};

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::events::ProgressEvent;

/// Tailing reader over a possibly-still-growing progress log.
pub struct LogReader {
    path: PathBuf,
    offset: u64,
}

impl LogReader {
    /// Create a reader starting at the beginning of `path`. The file does
    /// not need to exist yet; `poll` errors are transient until it does.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse all complete lines appended since the last poll.
    ///
    /// A terminated line that fails to parse is skipped with a diagnostic;
    /// an unterminated trailing chunk is left unconsumed and retried next
    /// time. I/O errors surface as `Err`; callers tailing a live file
    /// treat them as transient and poll again.
    pub fn poll(&mut self) -> Result<Vec<ProgressEvent>> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            // File shrank (truncated or replaced): start over.
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.take(len - self.offset).read_to_end(&mut buf)?;

        let mut events = Vec::new();
        let mut consumed = 0usize;
        while let Some(nl) = buf[consumed..].iter().position(|&b| b == b'\n') {
            let line = &buf[consumed..consumed + nl];
            consumed += nl + 1;
            if let Some(event) = parse_line(line) {
                events.push(event);
            }
        }
        self.offset += consumed as u64;
        Ok(events)
    }
}

fn parse_line(line: &[u8]) -> Option<ProgressEvent> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(_) => {
            debug!("skipping non-UTF-8 progress line");
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("skipping malformed progress line: {e}");
            None
        }
    }
}

/// One full pass over `path`: parse everything currently in the file and
/// fold it into a fresh [`TaskTree`].
pub fn summarize(path: impl Into<PathBuf>) -> Result<TaskTree> {
    let mut reader = LogReader::open(path);
    let mut tree = TaskTree::new();
    for event in reader.poll()? {
        tree.apply(&event);
    }
    Ok(tree)
}
