//! Read access to the queue's backing store.
//!
//! The tooling only ever reads: list slices, list lengths, lock keys,
//! settings and memory figures. Writers live elsewhere.

mod memory;
pub mod schema;
mod sqlite;

use crate::error::Result;
use std::collections::BTreeMap;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Memory figures reported by a backend, keyed like Redis `INFO memory`
/// (`used_memory_human`, `used_memory_peak_human`, ...). Fields a backend
/// cannot report are simply absent.
pub type MemoryStats = BTreeMap<String, String>;

pub const USED_MEMORY_HUMAN: &str = "used_memory_human";
pub const USED_MEMORY_PEAK_HUMAN: &str = "used_memory_peak_human";

/// Storage operations the analyzer and dashboard rely on.
pub trait Backend {
    /// Fail with `Error::BackendUnavailable` if the store cannot be used.
    fn test_connection(&self) -> Result<()>;

    /// Up to `count` raw items of list `key`, starting at offset `start`.
    /// An empty result means the list holds nothing at or past `start`.
    fn list_range(&self, key: &str, start: usize, count: usize) -> Result<Vec<Vec<u8>>>;

    fn list_len(&self, key: &str) -> Result<u64>;

    fn memory_stats(&self) -> Result<MemoryStats>;

    /// Number of live (unexpired) keys starting with `prefix`.
    fn count_keys_with_prefix(&self, prefix: &str) -> Result<u64>;

    /// Raw value of a queue setting, if configured.
    fn setting(&self, name: &str) -> Result<Option<String>>;
}

/// Redis-style byte count: `512B`, `1.50K`, `3.25M`, `1.00G`.
pub fn bytes_to_human(bytes: u64) -> String {
    const UNITS: [(&str, f64); 5] = [
        ("P", 1_125_899_906_842_624.0),
        ("T", 1_099_511_627_776.0),
        ("G", 1_073_741_824.0),
        ("M", 1_048_576.0),
        ("K", 1024.0),
    ];

    let value = bytes as f64;
    for (suffix, size) in UNITS {
        if value >= size {
            return format!("{:.2}{}", value / size, suffix);
        }
    }
    format!("{}B", bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_human() {
        assert_eq!(bytes_to_human(0), "0B");
        assert_eq!(bytes_to_human(1023), "1023B");
        assert_eq!(bytes_to_human(1536), "1.50K");
        assert_eq!(bytes_to_human(3 * 1_048_576), "3.00M");
        assert_eq!(bytes_to_human(1_073_741_824), "1.00G");
    }
}
