use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::errors::ScanError;
use crate::models::finding::SeverityCounts;
use crate::models::history::HistoryEntry;
use super::HistorySink;

/// SQLite-backed scan history, newest first, capped at `max_entries`.
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
    max_entries: usize,
}

impl HistoryStore {
    pub fn open(path: &Path, max_entries: usize) -> Result<Self, ScanError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| ScanError::Database(format!("Failed to open history database: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| ScanError::Database(format!("Failed to set pragmas: {}", e)))?;

        let store = Self { conn: Arc::new(Mutex::new(conn)), max_entries };
        store.initialize()?;
        Ok(store)
    }

    pub fn in_memory(max_entries: usize) -> Result<Self, ScanError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScanError::Database(format!("Failed to open in-memory db: {}", e)))?;
        let store = Self { conn: Arc::new(Mutex::new(conn)), max_entries };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), ScanError> {
        let conn = self.lock()?;
        conn.execute_batch(super::schema::CREATE_TABLES)
            .map_err(|e| ScanError::Database(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ScanError> {
        self.conn
            .lock()
            .map_err(|_| ScanError::Database("history connection lock poisoned".into()))
    }

    /// Most recent entries first.
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>, ScanError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, url, timestamp, high, medium, low FROM scan_history ORDER BY seq DESC LIMIT ?1")
            .map_err(|e| ScanError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt
            .query_map(rusqlite::params![limit as i64], |row: &rusqlite::Row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(|e| ScanError::Database(format!("Query failed: {}", e)))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, url, timestamp, high, medium, low) =
                row.map_err(|e| ScanError::Database(format!("Row read failed: {}", e)))?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ScanError::Database(format!("Bad timestamp '{}': {}", timestamp, e)))?;
            entries.push(HistoryEntry {
                id,
                url,
                timestamp,
                counts: SeverityCounts {
                    high: high.max(0) as usize,
                    medium: medium.max(0) as usize,
                    low: low.max(0) as usize,
                },
            });
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, ScanError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM scan_history", [], |row| row.get(0))
            .map_err(|e| ScanError::Database(format!("Query failed: {}", e)))?;
        Ok(count.max(0) as usize)
    }
}

impl HistorySink for HistoryStore {
    fn record(&self, entry: &HistoryEntry) -> Result<(), ScanError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scan_history (id, url, timestamp, high, medium, low) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.id,
                entry.url,
                entry.timestamp.to_rfc3339(),
                entry.counts.high as i64,
                entry.counts.medium as i64,
                entry.counts.low as i64,
            ],
        )
        .map_err(|e| ScanError::Database(format!("Failed to record history: {}", e)))?;

        let pruned = conn
            .execute(
                "DELETE FROM scan_history WHERE seq NOT IN (SELECT seq FROM scan_history ORDER BY seq DESC LIMIT ?1)",
                rusqlite::params![self.max_entries as i64],
            )
            .map_err(|e| ScanError::Database(format!("Failed to prune history: {}", e)))?;
        if pruned > 0 {
            debug!(pruned, max = self.max_entries, "Pruned old history entries");
        }
        Ok(())
    }
}

impl Clone for HistoryStore {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone(), max_entries: self.max_entries }
    }
}
