use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::error::{QuizError, Result};
use crate::record::{ScoreRecord, HEADERS};
use crate::store::ScoreStore;

/// Comma-separated file with a header row, one record per line.
#[derive(Debug)]
pub struct CsvScoreStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvScoreStore {
    /// Create the file (and parent directories) with a header if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };
        {
            let _guard = store.guard()?;
            store.ensure_file()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| QuizError::StorageUnavailable("score file lock poisoned".into()))
    }

    fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = ::csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADERS)?;
        writer.flush()?;
        Ok(())
    }
}

impl ScoreStore for CsvScoreStore {
    fn append(&self, record: &ScoreRecord) -> Result<()> {
        let _guard = self.guard()?;
        self.ensure_file()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = ::csv::WriterBuilder::new().has_headers(false).from_writer(file);
        // single write_record + flush keeps the row whole for readers holding the lock
        writer.write_record(record.to_fields())?;
        writer.flush()?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ScoreRecord>> {
        let _guard = self.guard()?;
        self.ensure_file()?;

        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(target: "store", line = line + 2, error = %e, "skipping unreadable score row");
                    continue;
                }
            };
            match ScoreRecord::from_fields(row.iter()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(target: "store", line = line + 2, error = %e, "skipping malformed score row")
                }
            }
        }
        Ok(records)
    }

    fn clear_all(&self) -> Result<()> {
        let _guard = self.guard()?;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        self.ensure_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(name: &str, score: u32, ts: &str) -> ScoreRecord {
        ScoreRecord::new(name, score, 30, parse_timestamp(ts).unwrap())
    }

    #[test]
    fn test_open_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.csv");
        CsvScoreStore::open(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "timestamp_utc,learner_name,score,total,percent\n");
    }

    #[test]
    fn test_append_and_load() {
        let dir = tempdir().unwrap();
        let store = CsvScoreStore::open(dir.path().join("scores.csv")).unwrap();

        store.append(&record("Maria Silva", 24, "2026-03-01 10:00:00")).unwrap();
        store.append(&record("João, o Grande", 30, "2026-03-01 11:00:00")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].learner_name, "Maria Silva");
        assert_eq!(loaded[0].percent, 80.0);
        // quoted field survives the round trip
        assert_eq!(loaded[1].learner_name, "João, o Grande");

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("2026-03-01 10:00:00,Maria Silva,24,30,80.00\n"));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        fs::write(
            &path,
            "timestamp_utc,learner_name,score,total,percent\n\
             2026-03-01 10:00:00,Ana,10,30,33.33\n\
             2026-03-01 10:05:00,Bruno,ten,30,33.33\n\
             2026-03-01 10:06:00,Carla\n\
             2026-03-01 10:07:00,Davi,15,30,50.00\n",
        )
        .unwrap();

        let store = CsvScoreStore::open(&path).unwrap();
        let names: Vec<String> = store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.learner_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Davi"]);
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CsvScoreStore::open(dir.path().join("scores.csv")).unwrap();
        store.append(&record("Ana", 10, "2026-03-01 10:00:00")).unwrap();

        store.clear_all().unwrap();
        assert!(store.load_all().unwrap().is_empty());
        store.clear_all().unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn test_load_recreates_deleted_file() {
        let dir = tempdir().unwrap();
        let store = CsvScoreStore::open(dir.path().join("scores.csv")).unwrap();
        fs::remove_file(store.path()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_appends_keep_rows_whole() {
        let dir = tempdir().unwrap();
        let store = Arc::new(CsvScoreStore::open(dir.path().join("scores.csv")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let name = format!("learner-{i}-{j}");
                        store.append(&record(&name, j, "2026-03-01 10:00:00")).unwrap();
                        store.load_all().unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.load_all().unwrap().len(), 80);
    }
}
