//! Score record persistence.
//!
//! The quiz only needs three primitives: append one finished record, read
//! everything back, and wipe the lot. Backends must make each append atomic
//! with respect to readers and to `clear_all`.

mod csv_store;
mod memory;
mod sqlite_store;

pub use csv_store::CsvScoreStore;
pub use memory::MemoryScoreStore;
pub use sqlite_store::SqliteScoreStore;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::record::ScoreRecord;

pub trait ScoreStore: Send + Sync {
    fn append(&self, record: &ScoreRecord) -> Result<()>;
    /// Rows that fail to decode are skipped, never returned as an error.
    fn load_all(&self) -> Result<Vec<ScoreRecord>>;
    /// Idempotent.
    fn clear_all(&self) -> Result<()>;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Csv,
    Sqlite,
    Memory,
}

/// Open the configured backend. `path` falls back to the state directory.
pub fn open(backend: StoreBackend, path: Option<PathBuf>) -> Result<Box<dyn ScoreStore>> {
    let store: Box<dyn ScoreStore> = match backend {
        StoreBackend::Csv => {
            let path = path
                .or_else(AppDirs::scores_csv_path)
                .unwrap_or_else(|| PathBuf::from("identiquiz_scores.csv"));
            Box::new(CsvScoreStore::open(path)?)
        }
        StoreBackend::Sqlite => {
            let path = path
                .or_else(AppDirs::scores_db_path)
                .unwrap_or_else(|| PathBuf::from("identiquiz_scores.db"));
            Box::new(SqliteScoreStore::open(path)?)
        }
        StoreBackend::Memory => Box::new(MemoryScoreStore::default()),
    };
    tracing::info!(target: "store", %backend, "score store opened");
    Ok(store)
}
