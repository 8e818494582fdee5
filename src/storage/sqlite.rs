use super::{Backend, MemoryStats, USED_MEMORY_HUMAN, bytes_to_human, schema};
use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Queue store kept in a SQLite file, opened read-only.
pub struct SqliteBackend {
    conn: Connection,
    path: PathBuf,
    cursor: RefCell<Option<ScanCursor>>,
}

/// Where the previous window of a list ended, so the next sequential
/// window can seek by position instead of skipping `start` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScanCursor {
    key: String,
    next_start: usize,
    last_position: i64,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::BackendUnavailable(format!("{}: {}", path.display(), e)))?;

        // Producers may be writing concurrently
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        Ok(SqliteBackend {
            conn,
            path: path.to_path_buf(),
            cursor: RefCell::new(None),
        })
    }
}

impl Backend for SqliteBackend {
    fn test_connection(&self) -> Result<()> {
        self.conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM settings) + (SELECT COUNT(*) FROM locks) \
                 + (SELECT COUNT(*) FROM (SELECT 1 FROM queue_items LIMIT 1))",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|_| ())
            .map_err(|e| {
                Error::BackendUnavailable(format!("{}: {}", self.path.display(), e))
            })
    }

    fn list_range(&self, key: &str, start: usize, count: usize) -> Result<Vec<Vec<u8>>> {
        let after = self
            .cursor
            .borrow()
            .as_ref()
            .filter(|c| c.key == key && c.next_start == start)
            .map(|c| c.last_position);

        let mut stmt = match after {
            Some(_) => self.conn.prepare_cached(
                "SELECT position, payload FROM queue_items \
                 WHERE list_key = ?1 AND position > ?2 ORDER BY position LIMIT ?3",
            )?,
            None => self.conn.prepare_cached(
                "SELECT position, payload FROM queue_items \
                 WHERE list_key = ?1 ORDER BY position LIMIT ?3 OFFSET ?2",
            )?,
        };
        let seek = after.unwrap_or(start as i64);
        let rows = stmt.query_map(rusqlite::params![key, seek, count as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut items = Vec::with_capacity(count);
        let mut last_position = None;
        for row in rows {
            let (position, payload) = row?;
            last_position = Some(position);
            items.push(payload);
        }

        *self.cursor.borrow_mut() = last_position.map(|last_position| ScanCursor {
            key: key.to_string(),
            next_start: start + items.len(),
            last_position,
        });
        Ok(items)
    }

    fn list_len(&self, key: &str) -> Result<u64> {
        let len: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM queue_items WHERE list_key = ?",
            [key],
            |row| row.get(0),
        )?;
        Ok(len as u64)
    }

    fn memory_stats(&self) -> Result<MemoryStats> {
        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;

        // SQLite has no peak figure, so only current usage is reported
        let used = (page_count * page_size).max(0) as u64;
        let mut stats = MemoryStats::new();
        stats.insert("used_memory".to_string(), used.to_string());
        stats.insert(USED_MEMORY_HUMAN.to_string(), bytes_to_human(used));
        Ok(stats)
    }

    fn count_keys_with_prefix(&self, prefix: &str) -> Result<u64> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM locks \
             WHERE substr(lock_key, 1, length(?1)) = ?1 AND expires_at_ms > ?2",
            rusqlite::params![prefix, now_ms],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn setting(&self, name: &str) -> Result<Option<String>> {
        Ok(schema::get_setting(&self.conn, name)?)
    }
}
