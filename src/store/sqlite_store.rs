use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::warn;

use crate::error::{QuizError, Result};
use crate::record::{format_timestamp, parse_timestamp, ScoreRecord};
use crate::store::ScoreStore;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS score_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp_utc TEXT NOT NULL,
        learner_name TEXT NOT NULL,
        score INTEGER NOT NULL,
        total INTEGER NOT NULL,
        percent REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_score_records_timestamp ON score_records(timestamp_utc);
"#;

/// SQLite-backed score history
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Mutex<Connection>,
}

impl SqliteScoreStore {
    /// Open (or create) the database file and make sure the table exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| QuizError::StorageUnavailable("database lock poisoned".into()))
    }
}

impl ScoreStore for SqliteScoreStore {
    fn append(&self, record: &ScoreRecord) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO score_records (timestamp_utc, learner_name, score, total, percent)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                format_timestamp(&record.timestamp_utc),
                record.learner_name,
                record.score,
                record.total,
                record.percent,
            ],
        )?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ScoreRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp_utc, learner_name, score, total, percent
            FROM score_records
            ORDER BY id
            "#,
        )?;

        // Pull raw column values first; decoding happens per row so a bad row is skipped.
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let decoded = (|| -> rusqlite::Result<(String, String, u32, u32, f64)> {
                Ok((row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
            })();
            Ok((id, decoded))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, decoded) = row?;
            let parsed = decoded
                .map_err(|e| QuizError::MalformedRecord(e.to_string()))
                .and_then(|(ts, learner_name, score, total, percent)| {
                    Ok(ScoreRecord {
                        timestamp_utc: parse_timestamp(&ts)?,
                        learner_name,
                        score,
                        total,
                        percent,
                    })
                });
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!(target: "store", id, error = %e, "skipping malformed score row"),
            }
        }

        Ok(records)
    }

    fn clear_all(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM score_records", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;
    use tempfile::tempdir;

    fn record(name: &str, score: u32, ts: &str) -> ScoreRecord {
        ScoreRecord::new(name, score, 30, parse_timestamp(ts).unwrap())
    }

    #[test]
    fn test_append_and_load_in_order() {
        let store = SqliteScoreStore::open_in_memory().unwrap();
        store.append(&record("Ana", 24, "2026-03-01 10:00:00")).unwrap();
        store.append(&record("Bruno", 12, "2026-03-01 09:00:00")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].learner_name, "Ana");
        assert_eq!(loaded[0].percent, 80.0);
        assert_eq!(loaded[1].learner_name, "Bruno");
        assert_eq!(
            loaded[1].timestamp_utc,
            parse_timestamp("2026-03-01 09:00:00").unwrap()
        );
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let store = SqliteScoreStore::open_in_memory().unwrap();
        store.append(&record("Ana", 24, "2026-03-01 10:00:00")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO score_records (timestamp_utc, learner_name, score, total, percent) \
                 VALUES ('not a time', 'Bruno', 1, 30, 3.33)",
                [],
            )
            .unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO score_records (timestamp_utc, learner_name, score, total, percent) \
                 VALUES ('2026-03-01 11:00:00', 'Carla', 'lots', 30, 3.33)",
                [],
            )
            .unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].learner_name, "Ana");
    }

    #[test]
    fn test_clear_all() {
        let store = SqliteScoreStore::open_in_memory().unwrap();
        store.append(&record("Ana", 24, "2026-03-01 10:00:00")).unwrap();

        store.clear_all().unwrap();
        assert!(store.load_all().unwrap().is_empty());
        store.clear_all().unwrap();
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("scores.db");
        {
            let store = SqliteScoreStore::open(&path).unwrap();
            store.append(&record("Ana", 24, "2026-03-01 10:00:00")).unwrap();
        }
        let store = SqliteScoreStore::open(&path).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
