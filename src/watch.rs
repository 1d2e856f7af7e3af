//! Regenerates the index whenever an article page changes, coalescing rapid
//! edit bursts (editor save-then-rewrite sequences) into a single run.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use notify::{Event, RecursiveMode, Watcher};

use crate::config::Config;
use crate::index;

/// How long the directory must stay quiet before a regeneration fires
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Runs one generation pass, then keeps watching the news directory and
/// regenerating after each quiet period. Only returns on a watch setup
/// failure; a failed generation pass is logged and retried on the next edit.
pub fn watch(config: &Config) -> anyhow::Result<()> {
    println!("Initial generation...");
    if let Err(err) = index::generate(config) {
        eprintln!("Initial generation failed: {:#}", err);
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let _ = tx.send(event);
    })?;
    watcher
        .watch(&config.news_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch news directory {:?}", &config.news_dir))?;

    println!("Watching for changes in {:?}", &config.news_dir);

    loop {
        let event = rx.recv().context("Watch channel closed")?;
        if !is_article_event(&event) {
            continue;
        }

        wait_for_quiet(&rx, QUIET_PERIOD)?;

        println!("Changes detected in {:?}, regenerating news index...", &config.news_dir);
        if let Err(err) = index::generate(config) {
            eprintln!("Regeneration failed: {:#}", err);
        } else {
            println!("Regeneration complete.");
        }
    }
}

/// Blocks until `quiet` elapses with no further article event. Each article
/// event restarts the countdown; unrelated events just keep waiting out the
/// remaining time.
fn wait_for_quiet(rx: &Receiver<notify::Result<Event>>, quiet: Duration) -> anyhow::Result<()> {
    let mut deadline = Instant::now() + quiet;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }

        match rx.recv_timeout(remaining) {
            Ok(event) => {
                if is_article_event(&event) {
                    deadline = Instant::now() + quiet;
                }
            }
            Err(RecvTimeoutError::Timeout) => return Ok(()),
            Err(RecvTimeoutError::Disconnected) => bail!("Watch channel closed"),
        }
    }
}

/// An event qualifies when any of its paths looks like an article page. The
/// template file counts too: editing it usually means the articles are next.
fn is_article_event(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => event
            .paths
            .iter()
            .filter_map(|path| path.file_name())
            .filter_map(|name| name.to_str())
            .any(index::has_article_ext),
        Err(err) => {
            eprintln!("Watch error: {}", err);
            false
        }
    }
}
