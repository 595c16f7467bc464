//! Text rendering for the reconstructed task tree.
//!
//! Pure formatting over [`TaskTree`]; no terminal control and no file
//! access, so the same code backs both the live view and `summary`.

use taskline_core::{TaskNode, TaskStatus, TaskTree};

const BAR_WIDTH: usize = 20;
const MIN_NAME_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_tree: bool,
    pub adaptive_time: bool,
}

struct Row {
    name: String,
    bar: String,
    count: String,
    elapsed: String,
    avg: String,
    status: &'static str,
}

/// Format the whole tree as aligned text lines, header included.
pub fn render_tree(tree: &TaskTree, opts: &RenderOptions) -> Vec<String> {
    let mut rows = Vec::new();
    let roots: Vec<&TaskNode> = tree.roots().collect();
    collect_rows(tree, &roots, "", opts, &mut rows);

    let name_width = rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_NAME_WIDTH);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "{:<name_width$} {:<25} {:>10} {:>12} {:>12} Status",
        "Task", "Progress", "Iter", "Elapsed", "Avg/iter"
    ));
    lines.push("-".repeat(name_width + 25 + 10 + 12 + 12 + 6 + 5));
    for row in rows {
        lines.push(
            format!(
                "{:<name_width$} {:<25} {:>10} {:>12} {:>12} {}",
                row.name, row.bar, row.count, row.elapsed, row.avg, row.status
            )
            .trim_end()
            .to_string(),
        );
    }
    lines
}

fn collect_rows(
    tree: &TaskTree,
    nodes: &[&TaskNode],
    indent: &str,
    opts: &RenderOptions,
    rows: &mut Vec<Row>,
) {
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();
        let prefix = if opts.show_tree && !indent.is_empty() {
            if is_last {
                "└─ "
            } else {
                "├─ "
            }
        } else {
            ""
        };
        rows.push(make_row(format!("{indent}{prefix}{}", node.name), node, opts));

        let children: Vec<&TaskNode> = tree.children(node).collect();
        if !children.is_empty() {
            let child_indent = if opts.show_tree {
                format!("{indent}{}", if is_last { "    " } else { "│   " })
            } else {
                format!("{indent}  ")
            };
            collect_rows(tree, &children, &child_indent, opts, rows);
        }
    }
}

fn make_row(name: String, node: &TaskNode, opts: &RenderOptions) -> Row {
    let bar = match node.fraction() {
        Some(fraction) => {
            let filled = ((fraction * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
            format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
        }
        // Show activity even without a known total.
        None if node.progress > 0 => format!("{:>width$} it", node.progress, width = BAR_WIDTH),
        None => " ".repeat(BAR_WIDTH + 1),
    };

    let count = match node.total {
        Some(total) => format!("{}/{total}", node.progress),
        None => node.progress.to_string(),
    };

    let secs = node
        .duration()
        .map(|d| d.num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0);
    let fmt = if opts.adaptive_time {
        format_duration_adaptive
    } else {
        format_duration_fixed
    };
    let avg = if node.progress > 0 {
        fmt(secs / node.progress as f64)
    } else {
        "---".to_string()
    };

    Row {
        name,
        bar,
        count,
        elapsed: fmt(secs),
        avg,
        status: status_label(node.status),
    }
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending | TaskStatus::Running => "…",
        TaskStatus::Succeeded => "succeeded",
        TaskStatus::Failed => "failed",
    }
}

/// Adaptive units: ms below a second, decimal seconds below ten, whole
/// seconds below a minute, then M:SS and H:MM:SS.
pub fn format_duration_adaptive(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "???".to_string();
    }
    let seconds = seconds.max(0.0);
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 10.0 {
        format!("{seconds:.1}s")
    } else if seconds < 60.0 {
        format!("{seconds:.0}s")
    } else if seconds < 3600.0 {
        format!("{}:{:02}", (seconds / 60.0) as u64, (seconds % 60.0) as u64)
    } else {
        let total = seconds as u64;
        format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}

/// Fixed millisecond precision: H:MM:SS.mmm, M:SS.mmm or S.mmm.
pub fn format_duration_fixed(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "???".to_string();
    }
    let ms = ((seconds % 1.0) * 1000.0) as u64;
    let total = seconds as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}.{ms:03}")
    } else if m > 0 {
        format!("{m}:{s:02}.{ms:03}")
    } else {
        format!("{s}.{ms:03}s")
    }
}
