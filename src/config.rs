use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::admin::AdminCredentials;
use crate::app_dirs::AppDirs;
use crate::error::{QuizError, Result};
use crate::rules::{RuleSet, DEFAULT_GENERIC_NAMES};
use crate::store::StoreBackend;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub question_bank: String,
    pub store_backend: StoreBackend,
    pub scores_path: Option<PathBuf>,
    pub min_name_len: usize,
    pub leaderboard_size: usize,
    pub recent_size: usize,
    pub generic_names: Vec<String>,
    pub admin_user: String,
    pub admin_pass: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_bank: "canonical".to_string(),
            store_backend: StoreBackend::Csv,
            scores_path: None,
            min_name_len: 3,
            leaderboard_size: 10,
            recent_size: 25,
            generic_names: DEFAULT_GENERIC_NAMES.iter().map(|s| s.to_string()).collect(),
            admin_user: "admin".to_string(),
            admin_pass: "admin".to_string(),
        }
    }
}

impl Config {
    pub fn rules(&self) -> RuleSet {
        RuleSet::with_generic_names(self.generic_names.iter().cloned())
    }

    /// Credentials from the file, overridden by `ADMIN_USER` / `ADMIN_PASS`.
    pub fn admin_credentials(&self) -> AdminCredentials {
        AdminCredentials::new(
            std::env::var("ADMIN_USER").unwrap_or_else(|_| self.admin_user.clone()),
            std::env::var("ADMIN_PASS").unwrap_or_else(|_| self.admin_pass.clone()),
        )
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("identiquiz_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(target: "identiquiz", path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| QuizError::Config(e.to_string()))?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(|e| QuizError::Config(e.to_string()))?;
        fs::write(&self.path, data).map_err(|e| QuizError::Config(e.to_string()))
    }
}
