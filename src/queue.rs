//! Handles over the sharded tracking queue: the manager, one handle per
//! shard, and the worker lock registry.

use crate::error::{Error, Result};
use crate::storage::Backend;

/// List key of shard 0. Other shards append `_{id}`.
pub const QUEUE_KEY_PREFIX: &str = "trackingQueueV1";

/// Key prefix of processing locks held by queue workers.
pub const LOCK_KEY_PREFIX: &str = "QueuedTrackingLock";

/// Batch size used when paging through a shard.
pub const SCAN_PAGE_SIZE: usize = 25;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_REQUESTS_TO_PROCESS: u64 = 25;

/// List key holding the request sets of shard `id`.
pub fn list_key(id: usize) -> String {
    if id == 0 {
        QUEUE_KEY_PREFIX.to_string()
    } else {
        format!("{}_{}", QUEUE_KEY_PREFIX, id)
    }
}

/// Queue configuration as stored alongside the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub number_of_queue_workers: usize,
    pub number_of_requests_to_process: u64,
    pub queue_enabled: bool,
    pub process_during_tracking_request: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            number_of_queue_workers: DEFAULT_WORKERS,
            number_of_requests_to_process: DEFAULT_REQUESTS_TO_PROCESS,
            queue_enabled: true,
            process_during_tracking_request: true,
        }
    }
}

impl Settings {
    /// Read settings from the backend, falling back to defaults for any
    /// that are not configured.
    pub fn load<B: Backend + ?Sized>(backend: &B) -> Result<Self> {
        let defaults = Settings::default();

        let number_of_queue_workers = match backend.setting("number_of_queue_workers")? {
            Some(raw) => parse_positive("number_of_queue_workers", &raw)? as usize,
            None => defaults.number_of_queue_workers,
        };
        let number_of_requests_to_process =
            match backend.setting("number_of_requests_to_process")? {
                Some(raw) => parse_positive("number_of_requests_to_process", &raw)?,
                None => defaults.number_of_requests_to_process,
            };
        let queue_enabled = match backend.setting("queue_enabled")? {
            Some(raw) => parse_flag("queue_enabled", &raw)?,
            None => defaults.queue_enabled,
        };
        let process_during_tracking_request =
            match backend.setting("process_during_tracking_request")? {
                Some(raw) => parse_flag("process_during_tracking_request", &raw)?,
                None => defaults.process_during_tracking_request,
            };

        Ok(Settings {
            number_of_queue_workers,
            number_of_requests_to_process,
            queue_enabled,
            process_during_tracking_request,
        })
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidArgument(format!(
            "setting {} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::InvalidArgument(format!(
            "setting {} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

/// Entry point to the shards of one queue.
pub struct QueueManager<'a, B: Backend + ?Sized> {
    backend: &'a B,
    settings: Settings,
}

impl<'a, B: Backend + ?Sized> QueueManager<'a, B> {
    pub fn new(backend: &'a B) -> Result<Self> {
        let settings = Settings::load(backend)?;
        Ok(QueueManager { backend, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn number_of_available_queues(&self) -> usize {
        self.settings.number_of_queue_workers
    }

    pub fn number_of_requests_to_process_at_same_time(&self) -> u64 {
        self.settings.number_of_requests_to_process
    }

    /// One handle per shard, in id order.
    pub fn all_queues(&self) -> Vec<Shard<'a, B>> {
        (0..self.number_of_available_queues())
            .map(|id| Shard {
                backend: self.backend,
                id,
                key: list_key(id),
            })
            .collect()
    }
}

/// Read handle on one shard's list.
pub struct Shard<'a, B: Backend + ?Sized> {
    backend: &'a B,
    id: usize,
    key: String,
}

impl<B: Backend + ?Sized> Shard<'_, B> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current list length. May already be stale when it returns.
    pub fn number_of_request_sets_in_queue(&self) -> Result<u64> {
        self.backend.list_len(&self.key)
    }

    /// Raw items `start..start + count` of this shard.
    pub fn range(&self, start: usize, count: usize) -> Result<Vec<Vec<u8>>> {
        self.backend.list_range(&self.key, start, count)
    }
}

/// Registry of worker processing locks.
pub struct Lock<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> Lock<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Lock { backend }
    }

    pub fn number_of_acquired_locks(&self) -> Result<u64> {
        self.backend.count_keys_with_prefix(LOCK_KEY_PREFIX)
    }
}
