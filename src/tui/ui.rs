use super::state::{DashboardState, Throughput};
use crate::format::format_thousands;
use crossterm::style::Stylize;

const RULE_WIDTH: usize = 30;
const CONTROLS: &str = "press (0-9.,q) or arrow(L,R,U,D)";
const UNKNOWN: &str = "Unknown";

/// Lines below the shard rows: rule, totals, rule and two status lines.
const FOOTER_LINES: usize = 5;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Column header, printed once above the refreshing area.
pub fn header_lines() -> Vec<String> {
    let title = format!("{:<10}{:<20}", " Q INDEX", " | REQUEST SETS");
    vec![rule(), title.black().on_white().bold().to_string(), rule()]
}

/// Number of lines [`frame_lines`] produces for `per_page` rows.
pub fn frame_height(per_page: usize) -> usize {
    per_page + FOOTER_LINES
}

/// The refreshing part of the dashboard: one row per visible shard, the
/// totals and the status lines. `clock` is the wall-clock label of this
/// refresh.
pub fn frame_lines(state: &DashboardState, clock: &str) -> Vec<String> {
    let pager = &state.pager;
    let snapshot = &state.snapshot;
    let mut lines = Vec::with_capacity(frame_height(pager.per_page()));

    for slot in pager.visible() {
        match slot {
            Some(idx) => {
                let depth = snapshot.depths.get(idx).copied().unwrap_or(0);
                lines.push(format!("{:>10} | {:>16}", idx, format_thousands(depth)));
            }
            None => lines.push(format!("{:10} | {:16}", "", "")),
        }
    }

    let totals = format!(
        "{:<10} | {:<16}",
        format!(" {} Q", pager.shard_count()),
        format!("{} R", format_thousands(snapshot.total))
    );
    lines.push(rule());
    lines.push(totals.black().on_white().bold().to_string());
    lines.push(rule());

    let first = (pager.current_page().max(1) - 1) as usize * pager.per_page();
    let last = first + pager.per_page() - 1;
    let page = format!("page {}/{}", pager.current_page(), pager.page_count());
    lines.push(format!(
        "Q [{}-{}] | {} | {} | diff/sec {}",
        first,
        last,
        page.green(),
        CONTROLS.yellow(),
        throughput_label(state.throughput)
    ));

    let stale = if state.stale {
        format!(" {}", "(stale)".red())
    } else {
        String::new()
    };
    lines.push(format!(
        "{} used memory ({} peak). {} workers active. updated {}{}",
        snapshot.used_memory.as_deref().unwrap_or(UNKNOWN),
        snapshot.peak_memory.as_deref().unwrap_or(UNKNOWN),
        snapshot.acquired_locks.to_string().green(),
        clock,
        stale
    ));

    lines
}

fn throughput_label(throughput: Option<Throughput>) -> String {
    match throughput {
        None => "-".to_string(),
        Some(Throughput::Draining(rate)) => {
            format!("+{:.2} draining", rate).green().bold().to_string()
        }
        Some(Throughput::Growing(rate)) => {
            format!("-{:.2} growing", rate).red().bold().to_string()
        }
    }
}
