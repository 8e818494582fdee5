use super::input::{self, Command};
use super::state::{DashboardState, PollSnapshot};
use super::terminal::InputSource;
use super::ui;
use crate::error::Result;
use crate::queue::{Lock, Shard};
use crate::storage::{Backend, USED_MEMORY_HUMAN, USED_MEMORY_PEAK_HUMAN};
use crossterm::{
    cursor::{MoveToColumn, MoveUp, SavePosition},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Pause between loop iterations. Short enough that keys feel immediate.
const TICK: Duration = Duration::from_millis(5);

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub per_page: usize,
    pub refresh_interval: Duration,
    /// Stop after this many refreshes
    pub iterations: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            per_page: 16,
            refresh_interval: Duration::from_secs(2),
            iterations: None,
        }
    }
}

/// Why the dashboard loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Interrupted,
    IterationsReached,
}

/// Live, paginated view of shard depths.
pub struct Dashboard<'s, 'a, B: Backend + ?Sized> {
    backend: &'a B,
    shards: &'s [Shard<'a, B>],
    lock: Lock<'a, B>,
    config: DashboardConfig,
    state: DashboardState,
    last_refresh: Option<Instant>,
    failed_polls: u64,
    last_poll_error: Option<String>,
}

impl<'s, 'a, B: Backend + ?Sized> Dashboard<'s, 'a, B> {
    pub fn new(backend: &'a B, shards: &'s [Shard<'a, B>], config: DashboardConfig) -> Self {
        Dashboard {
            backend,
            shards,
            lock: Lock::new(backend),
            state: DashboardState::new(shards.len(), config.per_page),
            config,
            last_refresh: None,
            failed_polls: 0,
            last_poll_error: None,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Failed polls so far and the most recent error. Logging is left to
    /// the caller once the terminal is back in normal mode.
    pub fn poll_failures(&self) -> (u64, Option<&str>) {
        (self.failed_polls, self.last_poll_error.as_deref())
    }

    /// Drive the dashboard until quit, cancellation or the iteration cap.
    ///
    /// `cancel` is checked at the top of every tick; signal handlers set it.
    /// Terminal setup and teardown are the caller's job.
    pub fn run<W: Write, I: InputSource>(
        &mut self,
        out: &mut W,
        input: &mut I,
        cancel: &AtomicBool,
    ) -> Result<Exit> {
        let mut navigated = false;

        loop {
            if cancel.load(Ordering::SeqCst) {
                return Ok(Exit::Interrupted);
            }

            let due = self
                .last_refresh
                .is_none_or(|at| at.elapsed() >= self.config.refresh_interval);
            if due || navigated {
                self.refresh(out)?;
                if let Some(limit) = self.config.iterations
                    && self.state.refreshes >= limit
                {
                    return Ok(Exit::IterationsReached);
                }
            }

            let raw = input.read_available()?;
            navigated = match input::decode(&raw) {
                Command::Quit => return Ok(Exit::Quit),
                command => self.state.pager.apply(command),
            };

            std::thread::sleep(TICK);
        }
    }

    fn refresh<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.state.pager.clamp();

        let now = Instant::now();
        match self.poll() {
            Ok(snapshot) => self.state.record_poll(snapshot, now),
            Err(e) => {
                self.failed_polls += 1;
                self.last_poll_error = Some(e.to_string());
                self.state.record_failed_poll();
            }
        }

        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        draw(out, &ui::frame_lines(&self.state, &clock))?;

        self.state.refreshes += 1;
        self.last_refresh = Some(now);
        Ok(())
    }

    fn poll(&self) -> Result<PollSnapshot> {
        let memory = self.backend.memory_stats()?;
        let acquired_locks = self.lock.number_of_acquired_locks()?;
        let depths = self
            .shards
            .iter()
            .map(|shard| shard.number_of_request_sets_in_queue())
            .collect::<Result<Vec<u64>>>()?;

        Ok(PollSnapshot {
            total: depths.iter().sum(),
            depths,
            used_memory: memory.get(USED_MEMORY_HUMAN).cloned(),
            peak_memory: memory.get(USED_MEMORY_PEAK_HUMAN).cloned(),
            acquired_locks,
        })
    }
}

/// Write a frame and park the cursor back at its first line, so the next
/// frame overwrites this one instead of scrolling.
fn draw<W: Write>(out: &mut W, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        queue!(out, Print(line), Clear(ClearType::UntilNewLine), Print("\r\n"))?;
    }
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    queue!(out, SavePosition, MoveToColumn(0), MoveUp(height))?;
    out.flush()
}
