use super::{Backend, MemoryStats};
use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// In-process queue store.
///
/// Lists, locks and settings are seeded through the builder-style methods;
/// the [`Backend`] side is read-only like every other backend. Marking the
/// store unavailable makes every backend call fail, which is how callers
/// exercise their error paths.
#[derive(Default)]
pub struct MemoryBackend {
    lists: RefCell<HashMap<String, VecDeque<Vec<u8>>>>,
    locks: RefCell<Vec<String>>,
    settings: RefCell<BTreeMap<String, String>>,
    memory: RefCell<MemoryStats>,
    unavailable: Cell<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, key: &str, item: impl Into<Vec<u8>>) {
        self.lists
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .push_back(item.into());
    }

    /// Drop up to `count` items from the head of a list.
    pub fn pop_front(&self, key: &str, count: usize) {
        if let Some(list) = self.lists.borrow_mut().get_mut(key) {
            for _ in 0..count.min(list.len()) {
                list.pop_front();
            }
        }
    }

    pub fn add_lock(&self, key: &str) {
        self.locks.borrow_mut().push(key.to_string());
    }

    pub fn set_setting(&self, name: &str, value: &str) {
        self.settings
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_memory_stat(&self, name: &str, value: &str) {
        self.memory
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.get() {
            return Err(Error::BackendUnavailable(
                "in-memory queue marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn test_connection(&self) -> Result<()> {
        self.check()
    }

    fn list_range(&self, key: &str, start: usize, count: usize) -> Result<Vec<Vec<u8>>> {
        self.check()?;
        Ok(self
            .lists
            .borrow()
            .get(key)
            .map(|list| list.iter().skip(start).take(count).cloned().collect())
            .unwrap_or_default())
    }

    fn list_len(&self, key: &str) -> Result<u64> {
        self.check()?;
        Ok(self.lists.borrow().get(key).map_or(0, |l| l.len() as u64))
    }

    fn memory_stats(&self) -> Result<MemoryStats> {
        self.check()?;
        Ok(self.memory.borrow().clone())
    }

    fn count_keys_with_prefix(&self, prefix: &str) -> Result<u64> {
        self.check()?;
        Ok(self
            .locks
            .borrow()
            .iter()
            .filter(|k| k.starts_with(prefix))
            .count() as u64)
    }

    fn setting(&self, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.settings.borrow().get(name).cloned())
    }
}
