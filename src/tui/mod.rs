mod app;
pub mod input;
mod state;
mod terminal;
mod ui;

use crate::error::{Error, Result};
use crate::queue::Shard;
use crate::storage::Backend;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use app::{Dashboard, DashboardConfig, Exit};
pub use state::{DashboardState, Pager, PollSnapshot, Throughput};
pub use terminal::{InputSource, StdinInput, TerminalSession};

/// Run the live dashboard on the controlling terminal.
///
/// SIGINT/SIGTERM, `q` and the iteration cap all end the loop normally;
/// the terminal is restored on every path, errors included.
pub fn run<B: Backend + ?Sized>(
    backend: &B,
    shards: &[Shard<'_, B>],
    config: DashboardConfig,
) -> Result<Exit> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| Error::Terminal(format!("Failed to set signal handler: {}", e)))?;

    let mut stdout = io::stdout();
    for line in ui::header_lines() {
        writeln!(stdout, "{}", line)?;
    }

    let mut session = TerminalSession::enter()?;
    let mut dashboard = Dashboard::new(backend, shards, config);
    let result = dashboard.run(&mut stdout, &mut StdinInput, &cancel);
    if dashboard.state().refreshes > 0 {
        session.mark_position_saved();
    }
    session.restore();

    // Nothing may reach stderr while the frame owns the terminal
    if let (failed @ 1.., Some(error)) = dashboard.poll_failures() {
        tracing::debug!(failed_polls = failed, last_error = error, "backend polls failed during monitoring");
    }

    result
}
