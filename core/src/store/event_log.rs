//! Store methods for the domain event log.

use crate::{
    error::{LabError, LabResult},
    event::{EventLogEntry, LabEvent},
    types::Timestamp,
};
use rusqlite::params;

use super::{format_timestamp, parse_timestamp, LabStore};

impl LabStore {
    pub fn append_event(&self, entry: &EventLogEntry) -> LabResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (profile_id, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.profile_id,
                entry.event_type,
                entry.payload,
                format_timestamp(entry.recorded_at),
            ],
        )?;
        Ok(())
    }

    /// Serialize and append a batch of events in one transaction.
    pub fn append_events(&mut self, profile_id: &str, events: &[LabEvent]) -> LabResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        for event in events {
            tx.execute(
                "INSERT INTO event_log (profile_id, event_type, payload, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    profile_id,
                    event.type_name(),
                    serde_json::to_string(event)?,
                    format_timestamp(event.at()),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// A profile's events in insertion order.
    pub fn events_for_profile(&self, profile_id: &str) -> LabResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, event_type, payload, recorded_at
             FROM event_log WHERE profile_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![profile_id], |row| {
                let recorded_at: String = row.get(4)?;
                Ok(EventLogEntry {
                    id:          Some(row.get(0)?),
                    profile_id:  row.get(1)?,
                    event_type:  row.get(2)?,
                    payload:     row.get(3)?,
                    recorded_at: parse_timestamp(&recorded_at, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, profile_id: &str, event_type: Option<&str>) -> LabResult<i64> {
        let count: i64 = match event_type {
            Some(kind) => self.conn.query_row(
                "SELECT COUNT(*) FROM event_log WHERE profile_id = ?1 AND event_type = ?2",
                params![profile_id, kind],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*) FROM event_log WHERE profile_id = ?1",
                params![profile_id],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Decoded events recorded at or after `since`.
    pub fn events_since(&self, profile_id: &str, since: Timestamp) -> LabResult<Vec<LabEvent>> {
        self.events_for_profile(profile_id)?
            .into_iter()
            .filter(|entry| entry.recorded_at >= since)
            .map(|entry| serde_json::from_str(&entry.payload).map_err(LabError::from))
            .collect()
    }
}
