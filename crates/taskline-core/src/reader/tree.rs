//! Task tree reconstruction from a flat event log.
//!
//! The tree is an arena of [`TaskNode`]s indexed by task id. Events are
//! applied in file order; all payload values are absolute, so replaying the
//! same file always produces the same tree. Parent-before-child is a soft
//! invariant only: a child whose parent has not been observed yet is parked
//! as an orphan and adopted once the parent materializes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::events::{EventKind, ProgressEvent, TaskStatus};

/// Reconstructed state of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub id: String,
    /// Task name from the `start` event; falls back to the id until one is
    /// seen.
    pub name: String,
    pub parent_id: Option<String>,
    pub total: Option<u64>,
    pub progress: u64,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Child ids in order of first observation.
    pub children: Vec<String>,
}

impl TaskNode {
    fn new(id: String, parent_id: Option<String>) -> Self {
        Self {
            name: id.clone(),
            id,
            parent_id,
            total: None,
            progress: 0,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            children: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock duration: end-to-start once finished, running time so far
    /// otherwise.
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        Some(self.ended_at.unwrap_or_else(Utc::now) - start)
    }

    /// Completed fraction in `0.0..=1.0`, when a total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some((self.progress as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Live task tree built by applying log events in order.
#[derive(Debug, Default)]
pub struct TaskTree {
    nodes: HashMap<String, TaskNode>,
    roots: Vec<String>,
    /// Children observed before their parent, keyed by the missing parent id.
    orphans: HashMap<String, Vec<String>>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// `update`/`finish` for an id with no prior `start` creates a
    /// placeholder node, since a reader may join mid-log.
    pub fn apply(&mut self, event: &ProgressEvent) {
        if !self.nodes.contains_key(&event.task_id) {
            self.insert(event.task_id.clone(), event.parent_id.clone());
        }
        let Some(node) = self.nodes.get_mut(&event.task_id) else {
            return;
        };
        match event.event {
            EventKind::Start => {
                if let Some(name) = &event.name {
                    node.name = name.clone();
                }
                node.total = event.total;
                node.status = TaskStatus::Running;
                node.started_at = Some(event.ts);
            }
            EventKind::Update => {
                if let Some(progress) = event.progress {
                    node.progress = progress;
                }
            }
            EventKind::Finish => {
                if let Some(progress) = event.progress {
                    node.progress = progress;
                }
                node.status = event.status.unwrap_or(TaskStatus::Succeeded);
                node.ended_at = Some(event.ts);
            }
        }
    }

    fn insert(&mut self, id: String, parent_id: Option<String>) {
        let mut node = TaskNode::new(id.clone(), parent_id.clone());
        // Adopt children that arrived before this node, in arrival order.
        if let Some(waiting) = self.orphans.remove(&id) {
            node.children = waiting;
        }
        match &parent_id {
            None => self.roots.push(id.clone()),
            Some(pid) => match self.nodes.get_mut(pid) {
                Some(parent) => parent.children.push(id.clone()),
                None => self.orphans.entry(pid.clone()).or_default().push(id.clone()),
            },
        }
        self.nodes.insert(id, node);
    }

    pub fn get(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root tasks in order of first observation.
    pub fn roots(&self) -> impl Iterator<Item = &TaskNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Children of `node` in order of first observation.
    pub fn children<'a>(&'a self, node: &'a TaskNode) -> impl Iterator<Item = &'a TaskNode> + 'a {
        node.children.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All known tasks, in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    /// True once at least one root exists and every root reached a terminal
    /// status. The viewer uses this as its natural exit condition.
    pub fn all_roots_terminal(&self) -> bool {
        !self.roots.is_empty() && self.roots().all(TaskNode::is_terminal)
    }
}
