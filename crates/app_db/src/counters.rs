//! Persistent named counters

use crate::{pool::conn, DbPool, Result};
use parking_lot::Mutex;
use rusqlite::OptionalExtension;
use std::collections::HashMap;

/// Well-known counter keys
pub mod keys {
    /// Number of media items deleted through the review feed
    pub const DELETED_PHOTO_COUNT: &str = "deleted_photo_count";
    /// Total bytes freed by those deletions
    pub const DELETED_PHOTO_SIZE: &str = "deleted_photo_size";
}

/// Crash-safe key/value counters with atomic increment.
///
/// Missing keys read as zero. Increments return the new value.
pub trait CounterStore: Send + Sync {
    fn increment_int(&self, key: &str, by: i32) -> Result<i32>;
    fn increment_long(&self, key: &str, by: i64) -> Result<i64>;
    fn read_int(&self, key: &str) -> Result<i32>;
    fn read_long(&self, key: &str) -> Result<i64>;
}

fn narrow(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Counters stored in the `counters` table
pub struct SqliteCounterStore {
    pool: DbPool,
}

impl SqliteCounterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn add(&self, key: &str, by: i64) -> Result<i64> {
        let conn = conn(&self.pool)?;

        // Single UPSERT statement, so the increment is atomic.
        // Saturates at the i64 bounds; SQLite would overflow to REAL.
        let value: i64 = conn.query_row(
            r#"
            INSERT INTO counters (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = CASE
                    WHEN excluded.value > 0 AND value > 9223372036854775807 - excluded.value
                        THEN 9223372036854775807
                    WHEN excluded.value < 0 AND value < (-9223372036854775807 - 1) - excluded.value
                        THEN (-9223372036854775807 - 1)
                    ELSE value + excluded.value
                END,
                updated_at = strftime('%s', 'now')
            RETURNING value
            "#,
            rusqlite::params![key, by],
            |row| row.get(0),
        )?;

        tracing::debug!(key, by, value, "Counter incremented");
        Ok(value)
    }

    fn get(&self, key: &str) -> Result<i64> {
        let conn = conn(&self.pool)?;

        let value: Option<i64> = conn
            .query_row("SELECT value FROM counters WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        Ok(value.unwrap_or(0))
    }

    /// Remove a counter entirely
    pub fn reset(&self, key: &str) -> Result<()> {
        let conn = conn(&self.pool)?;
        conn.execute("DELETE FROM counters WHERE key = ?1", [key])?;
        tracing::info!(key, "Counter reset");
        Ok(())
    }
}

impl CounterStore for SqliteCounterStore {
    fn increment_int(&self, key: &str, by: i32) -> Result<i32> {
        self.add(key, by as i64).map(narrow)
    }

    fn increment_long(&self, key: &str, by: i64) -> Result<i64> {
        self.add(key, by)
    }

    fn read_int(&self, key: &str) -> Result<i32> {
        self.get(key).map(narrow)
    }

    fn read_long(&self, key: &str) -> Result<i64> {
        self.get(key)
    }
}

/// Process-local counters, for tests and runs without a database
#[derive(Default)]
pub struct MemoryCounterStore {
    values: Mutex<HashMap<String, i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, key: &str, by: i64) -> i64 {
        let mut values = self.values.lock();
        let value = values.entry(key.to_string()).or_insert(0);
        *value = value.saturating_add(by);
        *value
    }

    fn get(&self, key: &str) -> i64 {
        self.values.lock().get(key).copied().unwrap_or(0)
    }
}

impl CounterStore for MemoryCounterStore {
    fn increment_int(&self, key: &str, by: i32) -> Result<i32> {
        Ok(narrow(self.add(key, by as i64)))
    }

    fn increment_long(&self, key: &str, by: i64) -> Result<i64> {
        Ok(self.add(key, by))
    }

    fn read_int(&self, key: &str) -> Result<i32> {
        Ok(narrow(self.get(key)))
    }

    fn read_long(&self, key: &str) -> Result<i64> {
        Ok(self.get(key))
    }
}
