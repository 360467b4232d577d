use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::logging::{log, obj, v_str, Domain, Level};

/// Key under which walkthrough completion is recorded.
pub const TOUR_FLAG_KEY: &str = "lensos_tour_completed";

/// Durable "walkthrough seen" flag.
///
/// `set` only ever records completion; nothing in the client clears it.
pub trait FlagStore {
    fn get(&self) -> Result<bool>;
    fn set(&mut self) -> Result<()>;
}

/// Flag persisted in a SQLite key/value table, surviving restarts.
pub struct SqliteFlagStore {
    conn: Connection,
    key: String,
}

impl SqliteFlagStore {
    pub fn open(path: &str) -> Result<Self> {
        let mut store = Self { conn: Connection::open(path)?, key: TOUR_FLAG_KEY.to_string() };
        store.init()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let mut store = Self { conn: Connection::open_in_memory()?, key: TOUR_FLAG_KEY.to_string() };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Removes the flag. This is the out-of-band reset used by the
    /// `tour_reset` tool, equivalent to clearing browser storage.
    pub fn clear(&mut self) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM client_state WHERE key = ?1", params![self.key])?;
        log(
            Level::Info,
            Domain::Persist,
            "flag_cleared",
            obj(&[("key", v_str(&self.key)), ("existed", serde_json::json!(removed > 0))]),
        );
        Ok(removed > 0)
    }
}

impl FlagStore for SqliteFlagStore {
    fn get(&self) -> Result<bool> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("true"))
    }

    fn set(&mut self) -> Result<()> {
        self.conn.execute(
            "INSERT INTO client_state (key, value, updated_at) VALUES (?1, 'true', ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.key, crate::logging::ts_now()],
        )?;
        Ok(())
    }
}

/// Process-local flag for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryFlagStore {
    completed: bool,
    pub writes: u32,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed() -> Self {
        Self { completed: true, writes: 0 }
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self) -> Result<bool> {
        Ok(self.completed)
    }

    fn set(&mut self) -> Result<()> {
        self.completed = true;
        self.writes += 1;
        Ok(())
    }
}
