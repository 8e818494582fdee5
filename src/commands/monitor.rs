use crate::error::Result;
use crate::queue::{QueueManager, Settings};
use crate::storage::{Backend, SqliteBackend};
use crate::tui::{self, DashboardConfig, Exit};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::Path;

/// Open the queue database at `path` and run the live dashboard.
pub fn run(path: &Path, config: DashboardConfig) -> Result<()> {
    let backend = SqliteBackend::open(path)?;
    backend.test_connection()?;

    let manager = QueueManager::new(&backend)?;
    let shards = manager.all_queues();

    let mut config = config;
    config.per_page = config.per_page.clamp(1, shards.len().max(1));

    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in preamble(manager.settings(), config.iterations) {
            writeln!(out, "{}", line)?;
        }
    }

    let exit = tui::run(&backend, &shards, config)?;
    match exit {
        Exit::Quit => tracing::debug!("dashboard closed by user"),
        Exit::Interrupted => tracing::debug!("dashboard interrupted"),
        Exit::IterationsReached => tracing::debug!("iteration limit reached"),
    }
    Ok(())
}

/// Summary of the queue configuration shown above the dashboard.
pub fn preamble(settings: &Settings, iterations: Option<u64>) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(iterations) = iterations {
        lines.push(format!("Only running {} iterations.", iterations).green().to_string());
    }

    if settings.queue_enabled {
        lines.push("Queue is enabled".to_string());
    } else {
        lines.push(
            "QUEUE IS DISABLED: No new requests will be written into the queue, \
             processing the remaining requests is still possible."
                .yellow()
                .to_string(),
        );
    }

    if settings.process_during_tracking_request {
        lines.push(
            "Request sets in the queue will be processed automatically after a tracking request"
                .to_string(),
        );
    } else {
        lines.push(format!(
            "The command {} has to be executed to process request sets within queue",
            "queuedtracking:process".yellow()
        ));
    }

    lines.push(format!(
        "Up to {} workers will be used",
        settings.number_of_queue_workers.to_string().green()
    ));
    lines.push(format!(
        "Processor will start once there are at least {} request sets in the queue",
        settings.number_of_requests_to_process.to_string().green()
    ));

    lines
}
