//! dirwatch - watch directories and print filesystem change events
//!
//! This binary provides the command-line interface for the dirwatch engine.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::Parser;
use dirwatch_engine::{ChangeKind, Engine, EventSink, FilterMask, WatchEvent, WatchId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "dirwatch")]
#[command(about = "Watch directories and print filesystem change events")]
#[command(version)]
struct Cli {
    /// Directories to watch
    #[arg(required = true, value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Watch subdirectories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Change categories to report: comma-separated list of
    /// file-name, dir-name, name, attributes, size, last-write, content,
    /// last-access, creation, security, all
    #[arg(short, long, default_value = "all", value_name = "SPEC")]
    filter: String,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Sink that prints every event to stdout
struct PrintSink {
    json: bool,
}

impl EventSink for PrintSink {
    fn on_event(&self, watch: WatchId, event: &WatchEvent) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "watch": watch, "event": event })
            );
            return;
        }
        match event {
            WatchEvent::Change { kind, path } => {
                println!("[{watch}] {:<12} {}", kind_label(kind), path.display());
            }
            WatchEvent::Overflow => {
                println!("[{watch}] overflow: some events were lost");
            }
        }
    }
}

fn kind_label(kind: &ChangeKind) -> String {
    match kind {
        ChangeKind::Added => "added".to_string(),
        ChangeKind::Removed => "removed".to_string(),
        ChangeKind::Modified => "modified".to_string(),
        ChangeKind::AttributesChanged => "attributes".to_string(),
        ChangeKind::Accessed => "accessed".to_string(),
        ChangeKind::RenamedFrom => "renamed-from".to_string(),
        ChangeKind::RenamedTo => "renamed-to".to_string(),
        ChangeKind::Unknown(raw) => format!("unknown({raw:#x})"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let filter = FilterMask::parse(&cli.filter).context("invalid --filter specification")?;
    let engine = Engine::new(Arc::new(PrintSink { json: cli.json }));

    for path in &cli.paths {
        let id = engine
            .add_watch(path, filter, cli.recursive)
            .with_context(|| format!("failed to watch {}", path.display()))?;
        info!(watch = id, path = %path.display(), recursive = cli.recursive, "watching");
    }

    // events arrive on the engine's worker threads until interrupted
    loop {
        std::thread::park();
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!("dirwatch={level},dirwatch_engine={level}"))
        .init();
}
