use super::input::Command;
use std::time::Instant;

/// Rows per page. Keeps a frame within what a cursor move can span.
pub const MAX_PER_PAGE: usize = 1000;

/// Pagination over shard rows.
///
/// `current_page` may drift out of range between refreshes (arrow keys are
/// applied unclamped); [`Pager::clamp`] pulls it back before every render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    current_page: i64,
    per_page: usize,
    shard_count: usize,
    page_count: usize,
}

impl Pager {
    /// `per_page` is clamped to `[1, shard_count]` and to [`MAX_PER_PAGE`].
    pub fn new(shard_count: usize, per_page: usize) -> Self {
        let per_page = per_page.min(shard_count).clamp(1, MAX_PER_PAGE);
        let page_count = shard_count.div_ceil(per_page).max(1);
        Pager {
            current_page: 1,
            per_page,
            shard_count,
            page_count,
        }
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn clamp(&mut self) {
        self.current_page = self.current_page.clamp(1, self.page_count as i64);
    }

    /// Shard indices shown on the current page; `None` pads past the end.
    /// Call after [`Pager::clamp`].
    pub fn visible(&self) -> Vec<Option<usize>> {
        let first = (self.current_page.max(1) as usize - 1) * self.per_page;
        (first..first + self.per_page)
            .map(|idx| (idx < self.shard_count).then_some(idx))
            .collect()
    }

    /// Apply a navigation command. Returns false for commands that do not
    /// move the page (`Quit`, `None`).
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Digit(d) => {
                let target = if d == 0 { 10 } else { d as i64 };
                // floor((page - 0.1) / 10) * 10 for integer pages
                self.current_page = (self.current_page - 1).div_euclid(10) * 10 + target;
            }
            Command::Next => self.current_page += 1,
            Command::Prev => self.current_page -= 1,
            Command::Next10 => self.current_page += 10,
            Command::Prev10 => self.current_page -= 10,
            Command::First => self.current_page = 1,
            Command::Last => self.current_page = self.page_count as i64,
            Command::Quit | Command::None => return false,
        }
        true
    }
}

/// Queue drain rate between two polls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Throughput {
    /// Depth fell by this many request sets per second
    Draining(f64),
    /// Depth rose by this many request sets per second
    Growing(f64),
}

impl Throughput {
    pub fn between(previous: u64, current: u64, elapsed_secs: f64) -> Option<Self> {
        if elapsed_secs <= 0.0 {
            return None;
        }
        let rate = (previous as f64 - current as f64) / elapsed_secs;
        let rate = (rate * 100.0).round() / 100.0;
        Some(if rate < 0.0 {
            Throughput::Growing(-rate)
        } else {
            Throughput::Draining(rate)
        })
    }
}

/// Last successful poll of the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PollSnapshot {
    pub depths: Vec<u64>,
    pub total: u64,
    pub used_memory: Option<String>,
    pub peak_memory: Option<String>,
    pub acquired_locks: u64,
}

/// Everything the dashboard carries between ticks.
pub struct DashboardState {
    pub pager: Pager,
    pub last_poll: Option<Instant>,
    pub last_total: Option<u64>,
    pub throughput: Option<Throughput>,
    pub snapshot: PollSnapshot,
    /// The latest poll failed and `snapshot` is from an earlier one
    pub stale: bool,
    pub refreshes: u64,
}

impl DashboardState {
    pub fn new(shard_count: usize, per_page: usize) -> Self {
        DashboardState {
            pager: Pager::new(shard_count, per_page),
            last_poll: None,
            last_total: None,
            throughput: None,
            snapshot: PollSnapshot {
                depths: vec![0; shard_count],
                ..PollSnapshot::default()
            },
            stale: false,
            refreshes: 0,
        }
    }

    /// Store a fresh poll and update the throughput estimate.
    pub fn record_poll(&mut self, snapshot: PollSnapshot, now: Instant) {
        if let (Some(previous), Some(at)) = (self.last_total, self.last_poll) {
            let elapsed = now.duration_since(at).as_secs_f64();
            if let Some(rate) = Throughput::between(previous, snapshot.total, elapsed) {
                self.throughput = Some(rate);
            }
        }
        self.last_total = Some(snapshot.total);
        self.last_poll = Some(now);
        self.snapshot = snapshot;
        self.stale = false;
    }

    /// Keep the previous snapshot after a failed poll. The throughput
    /// baseline stays at the last good poll.
    pub fn record_failed_poll(&mut self) {
        self.stale = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_per_page_capped_for_huge_queues() {
        let pager = Pager::new(70_000, 70_000);
        assert_eq!(pager.per_page(), MAX_PER_PAGE);
        assert_eq!(pager.page_count(), 70);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(Pager::new(5, 2).page_count(), 3);
        assert_eq!(Pager::new(16, 16).page_count(), 1);
        assert_eq!(Pager::new(17, 16).page_count(), 2);
        // perpage larger than shard count is clamped
        let pager = Pager::new(4, 16);
        assert_eq!(pager.per_page(), 4);
        assert_eq!(pager.page_count(), 1);
    }

    #[test]
    fn test_next_and_clamp_at_end() {
        let mut pager = Pager::new(5, 2);
        assert!(pager.apply(Command::Next));
        pager.clamp();
        assert_eq!(pager.current_page(), 2);

        pager.apply(Command::Last);
        pager.apply(Command::Next);
        assert_eq!(pager.current_page(), 4);
        pager.clamp();
        assert_eq!(pager.current_page(), 3);
    }

    #[test]
    fn test_prev_clamps_to_first() {
        let mut pager = Pager::new(5, 2);
        pager.apply(Command::Prev10);
        pager.clamp();
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_digit_jump_within_decade() {
        let mut pager = Pager::new(400, 1);
        pager.current_page = 23;
        pager.apply(Command::Digit(5));
        assert_eq!(pager.current_page(), 25);

        pager.current_page = 23;
        pager.apply(Command::Digit(0));
        assert_eq!(pager.current_page(), 30);

        pager.current_page = 30;
        pager.apply(Command::Digit(1));
        assert_eq!(pager.current_page(), 21);

        pager.current_page = 1;
        pager.apply(Command::Digit(9));
        assert_eq!(pager.current_page(), 9);
    }

    #[test]
    fn test_digit_jump_from_out_of_range_page() {
        // floor((0 - 0.1) / 10) = -1
        let mut pager = Pager::new(400, 1);
        pager.current_page = 0;
        pager.apply(Command::Digit(3));
        assert_eq!(pager.current_page(), -7);
        pager.clamp();
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_clamp_after_any_navigation() {
        let commands = [
            Command::Next,
            Command::Next10,
            Command::Prev,
            Command::Prev10,
            Command::Digit(0),
            Command::Digit(4),
            Command::First,
            Command::Last,
        ];
        let mut pager = Pager::new(37, 3);
        for _ in 0..5 {
            for command in commands {
                pager.apply(command);
                pager.clamp();
                let page = pager.current_page();
                assert!(page >= 1 && page <= pager.page_count() as i64);
            }
        }
    }

    #[test]
    fn test_visible_pads_last_page() {
        let mut pager = Pager::new(5, 2);
        pager.apply(Command::Last);
        pager.clamp();
        assert_eq!(pager.visible(), vec![Some(4), None]);
    }

    #[test]
    fn test_quit_and_none_do_not_navigate() {
        let mut pager = Pager::new(5, 2);
        assert!(!pager.apply(Command::Quit));
        assert!(!pager.apply(Command::None));
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_throughput_sign() {
        assert_eq!(Throughput::between(100, 80, 2.0), Some(Throughput::Draining(10.0)));
        assert_eq!(Throughput::between(80, 100, 2.0), Some(Throughput::Growing(10.0)));
        assert_eq!(Throughput::between(10, 10, 1.0), Some(Throughput::Draining(0.0)));
        assert_eq!(Throughput::between(1, 0, 3.0), Some(Throughput::Draining(0.33)));
        assert_eq!(Throughput::between(1, 0, 0.0), None);
    }

    #[test]
    fn test_record_poll_computes_throughput() {
        let mut state = DashboardState::new(2, 2);
        let t0 = Instant::now();
        state.record_poll(
            PollSnapshot {
                depths: vec![50, 50],
                total: 100,
                ..PollSnapshot::default()
            },
            t0,
        );
        assert_eq!(state.throughput, None);

        state.record_poll(
            PollSnapshot {
                depths: vec![40, 40],
                total: 80,
                ..PollSnapshot::default()
            },
            t0 + Duration::from_secs(2),
        );
        assert_eq!(state.throughput, Some(Throughput::Draining(10.0)));

        state.record_failed_poll();
        assert!(state.stale);
        assert_eq!(state.snapshot.total, 80);

        // Next good poll measures against the last good one
        state.record_poll(
            PollSnapshot {
                depths: vec![20, 20],
                total: 40,
                ..PollSnapshot::default()
            },
            t0 + Duration::from_secs(6),
        );
        assert!(!state.stale);
        assert_eq!(state.throughput, Some(Throughput::Draining(10.0)));
    }
}
