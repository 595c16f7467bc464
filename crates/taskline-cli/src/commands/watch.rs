//! Live terminal view of a progress log being written by another process.

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use tracing::debug;

use taskline_core::{LogReader, TaskTree, ViewerConfig};

use crate::render::{self, RenderOptions};

pub fn run(
    file: PathBuf,
    refresh: Option<u64>,
    no_tree: bool,
    fixed_time: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ViewerConfig::load()?;
    let refresh = Duration::from_millis(refresh.unwrap_or(config.refresh_ms));
    let opts = RenderOptions {
        show_tree: config.show_tree && !no_tree,
        adaptive_time: config.adaptive_time && !fixed_time,
    };

    let mut reader = LogReader::open(&file);
    let mut tree = TaskTree::new();

    terminal::enable_raw_mode()?;
    let outcome = watch_loop(&mut reader, &mut tree, refresh, &opts);
    terminal::disable_raw_mode()?;
    outcome?;

    // Leave the completed state on screen in normal terminal mode.
    println!("\nFinal state:");
    for line in render::render_tree(&tree, &opts) {
        println!("{line}");
    }
    Ok(())
}

fn watch_loop(
    reader: &mut LogReader,
    tree: &mut TaskTree,
    refresh: Duration,
    opts: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match reader.poll() {
            Ok(events) => {
                for event in &events {
                    tree.apply(event);
                }
            }
            // Transient: the file may not exist yet or be mid-rotation.
            Err(e) => debug!("progress poll failed: {e}"),
        }

        redraw(tree, opts)?;

        if tree.all_roots_terminal() {
            return Ok(());
        }
        if wait_for_quit(refresh)? {
            return Ok(());
        }
    }
}

fn redraw(tree: &TaskTree, opts: &RenderOptions) -> std::io::Result<()> {
    let mut out = stdout();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    if tree.is_empty() {
        queue!(out, Print("waiting for progress events..."), Print("\r\n"))?;
    } else {
        for line in render::render_tree(tree, opts) {
            queue!(out, Print(line), Print("\r\n"))?;
        }
    }
    queue!(out, Print("\r\n"), Print("press q to quit"), Print("\r\n"))?;
    out.flush()
}

/// Sleep for one refresh interval; true means the user asked to quit.
fn wait_for_quit(refresh: Duration) -> std::io::Result<bool> {
    let deadline = Instant::now() + refresh;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        if event::poll(deadline - now)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_quit(&key) {
                    return Ok(true);
                }
            }
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
