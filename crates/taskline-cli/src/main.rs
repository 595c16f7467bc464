use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "taskline", version, about = "Live viewer for Taskline progress logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a progress log and render the live task tree
    Watch {
        /// Path to the .progress.jsonl file
        file: PathBuf,
        /// Poll interval in milliseconds (defaults to the configured value)
        #[arg(long)]
        refresh: Option<u64>,
        /// Flat list instead of tree indentation
        #[arg(long)]
        no_tree: bool,
        /// Fixed H:MM:SS.mmm durations instead of adaptive units
        #[arg(long)]
        fixed_time: bool,
    },
    /// Print a summary table for a recorded run
    Summary {
        /// Path to the .progress.jsonl file
        file: PathBuf,
    },
    /// Viewer configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Watch {
            file,
            refresh,
            no_tree,
            fixed_time,
        } => commands::watch::run(file, refresh, no_tree, fixed_time),
        Commands::Summary { file } => commands::summary::run(file),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
