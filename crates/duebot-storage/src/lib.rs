//! duebot-storage: SQLite persistence for deadline rows.
//!
//! Stores the anchors as `%Y-%m-%d %H:%M:%S` text so that `ORDER BY due`
//! and the coarse pre-filter comparison work lexicographically. Concrete
//! occurrences are never persisted; the core recomputes them on read.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tokio::sync::Mutex;

use duebot_types::{DeadlineRecord, NewDeadline, Recurrence};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Text format for the anchor columns; sorts lexicographically in
/// chronological order.
const ANCHOR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn encode_anchor(dt: NaiveDateTime) -> String {
    dt.format(ANCHOR_FORMAT).to_string()
}

fn decode_anchor(idx: usize, text: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, ANCHOR_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeadlineRecord> {
    Ok(DeadlineRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        class_name: row.get(2)?,
        start: decode_anchor(3, &row.get::<_, String>(3)?)?,
        due: decode_anchor(4, &row.get::<_, String>(4)?)?,
        link: row.get(5)?,
        recurring: row
            .get::<_, Option<String>>(6)?
            .as_deref()
            .and_then(Recurrence::parse),
    })
}

const SELECT_COLUMNS: &str = "id, name, class, start, due, link, recurring";

/// SQLite-based storage for deadline rows.
pub struct DeadlineStore {
    conn: Arc<Mutex<Connection>>,
}

impl DeadlineStore {
    /// Open (or create) the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Storage opened: {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a new deadline, returning its assigned identifier.
    pub async fn add(&self, deadline: &NewDeadline) -> Result<i64> {
        let conn = self.conn.clone();
        let deadline = deadline.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO deadlines (name, class, start, due, link, recurring)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    deadline.name,
                    deadline.class_name,
                    encode_anchor(deadline.start),
                    encode_anchor(deadline.due),
                    deadline.link,
                    deadline.recurring.map(|r| r.as_str()),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?
    }

    /// All deadline rows, ordered by stored due ascending.
    pub async fn list_all(&self) -> Result<Vec<DeadlineRecord>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM deadlines ORDER BY due"
            ))?;
            let rows = stmt
                .query_map([], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    /// Coarse pre-filter for horizon queries and the reminder tick.
    ///
    /// Recurring rows always pass (their stored anchor says nothing about
    /// the next occurrence); non-recurring rows pass iff their stored due
    /// is at or before `cutoff`. A superset of the resolved filter, which
    /// the core applies after resolution.
    pub async fn list_due_within(&self, cutoff: NaiveDateTime) -> Result<Vec<DeadlineRecord>> {
        let conn = self.conn.clone();
        let cutoff = encode_anchor(cutoff);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM deadlines
                 WHERE recurring IS NOT NULL OR due <= ?1
                 ORDER BY due"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![cutoff], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    /// Delete a deadline by identifier. Returns false if no row matched;
    /// callers treat both outcomes as success.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let count = conn.execute("DELETE FROM deadlines WHERE id = ?1", rusqlite::params![id])?;
            Ok(count > 0)
        })
        .await?
    }
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS deadlines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    class TEXT NOT NULL,
    start TEXT NOT NULL,
    due TEXT NOT NULL,
    link TEXT,
    recurring TEXT
);";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn sample(name: &str, due: NaiveDateTime, recurring: Option<Recurrence>) -> NewDeadline {
        NewDeadline {
            name: name.into(),
            class_name: "Algorithms".into(),
            start: due - chrono::Duration::days(4),
            due,
            link: None,
            recurring,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = DeadlineStore::open_in_memory().unwrap();
        let id = store
            .add(&sample("Problem set 1", dt(2026, 3, 6, 17, 0), None))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let rows = store.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].name, "Problem set 1");
        assert_eq!(rows[0].due, dt(2026, 3, 6, 17, 0));
        assert!(rows[0].link.is_none());
        assert!(rows[0].recurring.is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_due() {
        let store = DeadlineStore::open_in_memory().unwrap();
        store
            .add(&sample("Later", dt(2026, 3, 20, 17, 0), None))
            .await
            .unwrap();
        store
            .add(&sample("Sooner", dt(2026, 3, 6, 17, 0), None))
            .await
            .unwrap();
        store
            .add(&sample("Middle", dt(2026, 3, 10, 9, 0), None))
            .await
            .unwrap();

        let rows = store.list_all().await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Sooner", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn test_link_and_recurrence_round_trip() {
        let store = DeadlineStore::open_in_memory().unwrap();
        let mut new = sample("Quiz", dt(2026, 3, 6, 17, 0), Some(Recurrence::Weekly));
        new.link = Some("https://example.edu/quiz".into());
        store.add(&new).await.unwrap();

        let rows = store.list_all().await.unwrap();
        assert_eq!(rows[0].recurring, Some(Recurrence::Weekly));
        assert_eq!(rows[0].link.as_deref(), Some("https://example.edu/quiz"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = DeadlineStore::open_in_memory().unwrap();
        let id = store
            .add(&sample("Essay", dt(2026, 3, 6, 17, 0), None))
            .await
            .unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());

        // Deleting a missing id reports false but is not an error
        assert!(!store.delete(id).await.unwrap());
        assert!(!store.delete(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_pre_filter_cutoff() {
        let store = DeadlineStore::open_in_memory().unwrap();
        store
            .add(&sample("In range", dt(2026, 3, 6, 17, 0), None))
            .await
            .unwrap();
        store
            .add(&sample("Out of range", dt(2026, 4, 1, 17, 0), None))
            .await
            .unwrap();

        let rows = store.list_due_within(dt(2026, 3, 10, 0, 0)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "In range");
    }

    #[tokio::test]
    async fn test_pre_filter_keeps_recurring() {
        let store = DeadlineStore::open_in_memory().unwrap();
        // Stored anchor far in the past: must still be returned, since its
        // next occurrence is recomputed by the core.
        store
            .add(&sample(
                "Weekly quiz",
                dt(2025, 9, 5, 17, 0),
                Some(Recurrence::Weekly),
            ))
            .await
            .unwrap();
        // And one far in the future, also recurring
        store
            .add(&sample(
                "Weekly lab",
                dt(2027, 1, 8, 12, 0),
                Some(Recurrence::Weekly),
            ))
            .await
            .unwrap();

        let rows = store.list_due_within(dt(2026, 3, 10, 0, 0)).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
