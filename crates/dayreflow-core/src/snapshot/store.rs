//! SQLite-backed snapshot storage.
//!
//! Provides persistent storage for:
//! - One row per capture, with a label and creation time
//! - The captured records of each capture, in timeline order, as JSON text

use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::record::SnapshotRecord;
use crate::error::StorageError;
use crate::storage::{data_dir, Config};

/// Monotonically increasing identifier of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub i64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stored capture with its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub label: String,
    pub created_at: DateTime<FixedOffset>,
    pub records: Vec<SnapshotRecord>,
}

/// Listing entry without the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub label: String,
    pub created_at: DateTime<FixedOffset>,
    pub record_count: usize,
}

/// Durable, versioned snapshot storage.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open the store named in `config` inside the data directory.
    pub fn open_default(config: &Config) -> crate::error::Result<Self> {
        let path = data_dir()?.join(&config.snapshots.database);
        Ok(Self::open(&path)?)
    }

    /// Open an in-memory store (for tests and dry runs).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                label       TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshot_records (
                snapshot_id INTEGER NOT NULL,
                position    INTEGER NOT NULL,
                event_id    TEXT NOT NULL,
                payload     TEXT NOT NULL,
                PRIMARY KEY (snapshot_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_snapshot_records_event ON snapshot_records(event_id);",
        )?;
        Ok(())
    }

    /// Persist a new capture and return its id.
    ///
    /// # Errors
    /// Returns an error if a record cannot be encoded or an insert fails.
    /// Nothing is stored in that case.
    pub fn save(
        &self,
        label: &str,
        records: &[SnapshotRecord],
        now: DateTime<FixedOffset>,
    ) -> Result<SnapshotId, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO snapshots (label, created_at) VALUES (?1, ?2)",
            params![label, now.to_rfc3339()],
        )?;
        let id = tx.last_insert_rowid();

        for (position, record) in records.iter().enumerate() {
            let payload = serde_json::to_string(record).map_err(|e| StorageError::CorruptRecord {
                snapshot: id,
                message: e.to_string(),
            })?;
            tx.execute(
                "INSERT INTO snapshot_records (snapshot_id, position, event_id, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, position as i64, record.id, payload],
            )?;
        }

        tx.commit()?;
        tracing::info!(snapshot = id, label, records = records.len(), "snapshot saved");
        Ok(SnapshotId(id))
    }

    /// The most recent capture, if any.
    pub fn latest(&self) -> Result<Option<Snapshot>, StorageError> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM snapshots", [], |row| row.get(0))?;
        match id {
            Some(id) => self.load(SnapshotId(id)),
            None => Ok(None),
        }
    }

    /// Load one capture with its records.
    pub fn load(&self, id: SnapshotId) -> Result<Option<Snapshot>, StorageError> {
        let header = self
            .conn
            .query_row(
                "SELECT label, created_at FROM snapshots WHERE id = ?1",
                params![id.0],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((label, created_at)) = header else {
            return Ok(None);
        };

        let created_at = parse_instant(id, &created_at)?;
        let records = self.records(id)?;
        Ok(Some(Snapshot {
            id,
            label,
            created_at,
            records,
        }))
    }

    fn records(&self, id: SnapshotId) -> Result<Vec<SnapshotRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM snapshot_records
             WHERE snapshot_id = ?1
             ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id.0], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            let payload = row?;
            let record = serde_json::from_str(&payload).map_err(|e| StorageError::CorruptRecord {
                snapshot: id.0,
                message: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// All captures, newest first.
    pub fn list(&self) -> Result<Vec<SnapshotSummary>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.label, s.created_at, COUNT(r.position)
             FROM snapshots s
             LEFT JOIN snapshot_records r ON r.snapshot_id = s.id
             GROUP BY s.id
             ORDER BY s.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, label, created_at, count) = row?;
            let id = SnapshotId(id);
            out.push(SnapshotSummary {
                id,
                label,
                created_at: parse_instant(id, &created_at)?,
                record_count: count as usize,
            });
        }
        Ok(out)
    }

    /// Remove a capture. Returns false if it did not exist.
    pub fn discard(&self, id: SnapshotId) -> Result<bool, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM snapshot_records WHERE snapshot_id = ?1", params![id.0])?;
        let removed = tx.execute("DELETE FROM snapshots WHERE id = ?1", params![id.0])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

fn parse_instant(id: SnapshotId, raw: &str) -> Result<DateTime<FixedOffset>, StorageError> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| StorageError::CorruptRecord {
        snapshot: id.0,
        message: format!("bad created_at '{raw}': {e}"),
    })
}
