use std::sync::RwLock;

use crate::error::{QuizError, Result};
use crate::record::ScoreRecord;
use crate::store::ScoreStore;

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: RwLock<Vec<ScoreRecord>>,
}

impl MemoryScoreStore {
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

fn poisoned<T>(_: T) -> QuizError {
    QuizError::StorageUnavailable("memory store lock poisoned".into())
}

impl ScoreStore for MemoryScoreStore {
    fn append(&self, record: &ScoreRecord) -> Result<()> {
        self.records.write().map_err(poisoned)?.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ScoreRecord>> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn clear_all(&self) -> Result<()> {
        self.records.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_load_clear() {
        let store = MemoryScoreStore::default();
        assert!(store.load_all().unwrap().is_empty());

        store.append(&ScoreRecord::now("Ana", 1, 2)).unwrap();
        store.append(&ScoreRecord::now("Bia", 2, 2)).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);

        store.clear_all().unwrap();
        store.clear_all().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}
