use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "shardscope")]
#[command(about = "Read-only diagnostics for a sharded tracking-request queue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Queue database to inspect
    #[arg(long, global = true, default_value = "queue.db")]
    pub queue_db: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze the request sets currently queued. May take a while on large queues
    #[command(visible_alias = "analyse")]
    Analyze,

    /// Show and update queue depths, memory and worker locks.
    ///
    /// Keys: ,=first page .=last page 0-9=jump within the current ten pages
    /// LEFT/RIGHT=previous/next page DOWN/UP=back/forward ten pages q=quit
    Monitor {
        /// Stop after this many refreshes (default: run until quit)
        #[arg(long, value_parser = parse_positive)]
        iterations: Option<u64>,

        /// Shards shown per page (capped at the shard count)
        #[arg(long = "perpage", short = 'p', default_value = "16", value_parser = parse_positive)]
        per_page: u64,

        /// Refresh interval
        #[arg(long, default_value = "2s", value_parser = parse_duration)]
        refresh: Duration,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_positive(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' needs to be numeric", s))?;
    if value == 0 {
        return Err("needs to be a non-zero positive number".to_string());
    }
    Ok(value)
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    // Try humantime first
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    // Try bare number as milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    Err(format!(
        "Invalid duration '{}'. Examples: 500ms, 2s, 1m, 2000",
        s
    ))
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Monitor { refresh, .. } = &self.command
            && refresh.is_zero()
        {
            return Err("Refresh interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_defaults() {
        let cli = Cli::try_parse_from(["shardscope", "monitor"]).unwrap();
        match cli.command {
            Command::Monitor {
                iterations,
                per_page,
                refresh,
            } => {
                assert_eq!(iterations, None);
                assert_eq!(per_page, 16);
                assert_eq!(refresh, Duration::from_secs(2));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.queue_db, PathBuf::from("queue.db"));
    }

    #[test]
    fn test_monitor_flags() {
        let cli = Cli::try_parse_from([
            "shardscope",
            "--queue-db",
            "/tmp/q.db",
            "monitor",
            "--iterations=3",
            "--perpage=4",
            "--refresh",
            "500ms",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Monitor {
                iterations: Some(3),
                per_page: 4,
                ..
            }
        ));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_numeric_flags_rejected() {
        for args in [
            ["shardscope", "monitor", "--iterations=abc"],
            ["shardscope", "monitor", "--iterations=0"],
            ["shardscope", "monitor", "--perpage=-2"],
            ["shardscope", "monitor", "--perpage=0"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{:?} should fail", args);
        }
    }

    #[test]
    fn test_analyse_alias() {
        let cli = Cli::try_parse_from(["shardscope", "analyse"]).unwrap();
        assert!(matches!(cli.command, Command::Analyze));
    }

    #[test]
    fn test_zero_refresh_rejected() {
        let cli = Cli::try_parse_from(["shardscope", "monitor", "--refresh", "0s"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
