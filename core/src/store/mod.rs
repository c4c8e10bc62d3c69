//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine never sees it; the session decides when to write.

use crate::{
    error::{LabError, LabResult},
    types::Timestamp,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

mod event_log;
mod snapshot;

pub struct LabStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LabStore {
    /// Open (or create) the lab database at `path`.
    pub fn open(path: &str) -> LabResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LabResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new, empty database.
    pub fn reopen(&self) -> LabResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> LabResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Key-value blobs ────────────────────────────────────────

    pub fn get(&self, namespace: &str, key: &str) -> LabResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        updated_at: Timestamp,
    ) -> LabResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (namespace, key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![namespace, key, value, format_timestamp(updated_at)],
        )?;
        Ok(())
    }

    /// Returns true if a value was removed.
    pub fn remove(&self, namespace: &str, key: &str) -> LabResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM kv_store WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(removed > 0)
    }

    /// All keys in a namespace, sorted.
    pub fn keys(&self, namespace: &str) -> LabResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store WHERE namespace = ?1 ORDER BY key ASC")?;
        let keys = stmt
            .query_map(params![namespace], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn updated_at(&self, namespace: &str, key: &str) -> LabResult<Option<Timestamp>> {
        let raw = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        raw.map(|text| parse_timestamp(&text, 0).map_err(LabError::from))
            .transpose()
    }
}

#[cfg(test)]
impl LabStore {
    /// Raw SQL for tests that need to break the schema.
    pub(crate) fn execute_raw(&self, sql: &str) -> LabResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

pub(crate) fn format_timestamp(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(text: &str, column: usize) -> rusqlite::Result<Timestamp> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
