//! Full scan of the queue measuring how evenly requests are sharded and
//! how many would move under the current shard count.

mod stats;

pub use stats::{DistributionStats, IdSource, KeySource, ShardingKey, classify};

use crate::error::Result;
use crate::format::{format_thousands, join_distribution};
use crate::queue::{SCAN_PAGE_SIZE, Shard};
use crate::storage::Backend;
use crate::tracking::RequestSet;
use comfy_table::{CellAlignment, Table};
use std::io::Write;
use std::time::Duration;

/// Scans every shard once, front to back, writing progress to `out`.
pub struct DistributionAnalyzer<'s, 'a, B: Backend + ?Sized> {
    shards: &'s [Shard<'a, B>],
    stats: DistributionStats,
}

impl<'s, 'a, B: Backend + ?Sized> DistributionAnalyzer<'s, 'a, B> {
    pub fn new(shards: &'s [Shard<'a, B>]) -> Self {
        DistributionAnalyzer {
            shards,
            stats: DistributionStats::new(shards.len()),
        }
    }

    /// Run the scan to completion and return the accumulated stats.
    ///
    /// Malformed items and unusable visitor ids are tallied, never fatal.
    /// Backend and output errors abort the scan.
    pub fn run<W: Write>(mut self, out: &mut W) -> Result<DistributionStats> {
        let total_shards = self.shards.len();

        for (index, shard) in self.shards.iter().enumerate() {
            let reported = shard.number_of_request_sets_in_queue()?;
            let mut start = 0;

            // The reported length can be stale; an empty window ends the shard
            loop {
                let items = shard.range(start, SCAN_PAGE_SIZE)?;
                if items.is_empty() {
                    break;
                }

                for (offset, raw) in items.iter().enumerate() {
                    self.process_item(index, raw, start + offset);
                }
                start += items.len();

                writeln!(
                    out,
                    "Currently analyzing queue {} of {} ({} of about {} request sets). \
                     Stats: {}, OldDistribution: {}, NewDistribution: {}",
                    index + 1,
                    total_shards,
                    start,
                    reported,
                    self.stats.counters_readable(),
                    join_distribution(&self.stats.old_distribution),
                    join_distribution(&self.stats.new_distribution),
                )?;
            }
        }

        Ok(self.stats)
    }

    fn process_item(&mut self, shard_index: usize, raw: &[u8], position: usize) {
        let set = match RequestSet::decode(raw) {
            Ok(set) => set,
            Err(e) => {
                tracing::debug!(shard = shard_index, position, error = %e, "skipping undecodable item");
                self.stats.record_invalid();
                return;
            }
        };

        self.stats.record_request_set(set.len());

        for request in set.requests() {
            self.stats.record_id_source(classify(request));

            let key = ShardingKey::for_request(request);
            if let Some(invalid) = &key.invalid {
                tracing::debug!(shard = shard_index, position, error = %invalid, "falling back to IP");
            }
            self.stats.record_assignment(shard_index, &key);
        }
    }
}

/// Convenience wrapper: scan `shards` and return the stats.
pub fn analyze<B: Backend + ?Sized, W: Write>(
    shards: &[Shard<'_, B>],
    out: &mut W,
) -> Result<DistributionStats> {
    DistributionAnalyzer::new(shards).run(out)
}

/// Final summary printed after a scan.
pub fn write_report<B: Backend + ?Sized, W: Write>(
    out: &mut W,
    stats: &DistributionStats,
    shards: &[Shard<'_, B>],
    elapsed: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Starting letter analysis: {}",
        stats.starting_letters_readable()
    )?;
    writeln!(
        out,
        "Analysed {} requests within {} request sets in {} second(s)",
        stats.total_requests(),
        stats.total_request_sets(),
        elapsed.as_secs_f64().ceil() as u64
    )?;

    let total = stats.total_requests();
    let pct = if total == 0 {
        0.0
    } else {
        stats.relocated_requests as f64 * 100.0 / total as f64
    };
    writeln!(
        out,
        "Drift: relocated {} of {} requests ({:.1}%)",
        format_thousands(stats.relocated_requests),
        format_thousands(total),
        pct
    )?;

    if !shards.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", distribution_table(stats, shards))?;
    }

    Ok(())
}

fn distribution_table<B: Backend + ?Sized>(
    stats: &DistributionStats,
    shards: &[Shard<'_, B>],
) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["SHARD", "LIST KEY", "OLD", "NEW", "DELTA"]);

    for (index, shard) in shards.iter().enumerate() {
        let old = stats.old_distribution.get(index).copied().unwrap_or(0);
        let new = stats.new_distribution.get(index).copied().unwrap_or(0);
        let delta = new as i64 - old as i64;
        table.add_row(vec![
            shard.id().to_string(),
            shard.key().to_string(),
            format_thousands(old),
            format_thousands(new),
            format!("{:+}", delta),
        ]);
    }

    for column in 2..5 {
        if let Some(col) = table.column_mut(column) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    table
}
