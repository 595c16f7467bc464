//! # Taskline Core Library
//!
//! Hierarchical progress logging to an append-only JSONL sidecar file, plus
//! the reader used to reconstruct live task trees from one. The CLI viewer
//! is a thin layer over this crate; any process can tail the same file
//! independently.
//!
//! ## Architecture
//!
//! - **Events**: one JSON object per line; field names and enum strings are
//!   a stable wire contract
//! - **Session / Writer**: producer calls enqueue events into a channel
//!   drained by a single background thread, so reporting progress never
//!   blocks on file I/O
//! - **Task Handles**: RAII handles that always emit a terminal event, even
//!   when dropped during panic unwinding
//! - **Reader / Tree**: offset-based tailing with skip-and-retry for partial
//!   lines, folding events into an id-indexed task tree
//!
//! ## Key Components
//!
//! - [`Session`]: sidecar file lifetime, queue and writer thread
//! - [`Task`]: the unit of the producer API
//! - [`LogReader`] / [`TaskTree`]: consumer-side reconstruction
//! - [`ViewerConfig`]: persisted viewer preferences

pub mod config;
pub mod error;
pub mod events;
pub mod reader;
pub mod session;
pub mod task;

pub use config::{config_dir, ViewerConfig};
pub use error::{ConfigError, CoreError, Result, SessionError, ValidationError};
pub use events::{EventKind, ProgressEvent, TaskStatus};
pub use reader::{summarize, LogReader, TaskNode, TaskTree};
pub use session::{Session, SessionOptions, DISABLE_ENV};
pub use task::Task;
