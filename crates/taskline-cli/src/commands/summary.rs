//! One-shot summary table for a recorded run.

use std::path::PathBuf;

use taskline_core::{summarize, ViewerConfig};

use crate::render::{self, RenderOptions};

pub fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let tree = summarize(&file)?;
    if tree.is_empty() {
        println!("no progress events in {}", file.display());
        return Ok(());
    }

    let config = ViewerConfig::load()?;
    let opts = RenderOptions {
        show_tree: config.show_tree,
        adaptive_time: config.adaptive_time,
    };
    for line in render::render_tree(&tree, &opts) {
        println!("{line}");
    }
    Ok(())
}
