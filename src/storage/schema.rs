use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 1;

/// Create the queue tables if they do not exist yet.
///
/// Producers own this layout; the tooling only opens it read-only. It is
/// exposed so fixtures and producers agree on one definition.
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Queue settings (worker count, batch size, flags)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- One row per queued request set, ordered within its list
        CREATE TABLE IF NOT EXISTS queue_items (
            list_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            payload BLOB NOT NULL,
            PRIMARY KEY (list_key, position)
        );

        -- Worker locks with absolute expiry
        CREATE TABLE IF NOT EXISTS locks (
            lock_key TEXT PRIMARY KEY,
            expires_at_ms INTEGER NOT NULL
        );
        "#,
    )?;
    set_setting(conn, "schema_version", &SCHEMA_VERSION.to_string())
}

/// Set a queue setting
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
        [key, value],
    )?;
    Ok(())
}

/// Get a queue setting
pub fn get_setting(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
        row.get(0)
    })
    .optional()
}

/// Append a payload to the end of a list
pub fn push_item(conn: &Connection, list_key: &str, payload: &[u8]) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO queue_items (list_key, position, payload)
         VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM queue_items WHERE list_key = ?1), ?2)",
        rusqlite::params![list_key, payload],
    )?;
    Ok(())
}

/// Record a held lock
pub fn put_lock(conn: &Connection, lock_key: &str, expires_at_ms: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO locks (lock_key, expires_at_ms) VALUES (?, ?)",
        rusqlite::params![lock_key, expires_at_ms],
    )?;
    Ok(())
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
