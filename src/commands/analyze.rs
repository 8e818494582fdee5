use crate::analysis;
use crate::error::Result;
use crate::queue::QueueManager;
use crate::storage::{Backend, SqliteBackend};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

/// Run the distribution analysis against the queue database at `path`.
pub fn run(path: &Path) -> Result<()> {
    let backend = SqliteBackend::open(path)?;
    backend.test_connection()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    analyze_backend(&backend, &mut out)
}

/// Scan every shard of `backend` and write progress plus the final report.
pub fn analyze_backend<B: Backend + ?Sized, W: Write>(backend: &B, out: &mut W) -> Result<()> {
    let manager = QueueManager::new(backend)?;
    let shards = manager.all_queues();
    tracing::debug!(shards = shards.len(), "starting distribution analysis");

    let start = Instant::now();
    let stats = analysis::analyze(&shards, out)?;
    analysis::write_report(out, &stats, &shards, start.elapsed())?;
    out.flush()?;

    Ok(())
}
