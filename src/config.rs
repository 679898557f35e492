use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::query::EmptyTermPolicy;
use crate::utils;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub page_size: usize,
    pub empty_search: EmptyTermPolicy,
    pub booking_db: Option<PathBuf>,
    pub trivia_db: Option<PathBuf>,
    pub coffee_db: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            empty_search: EmptyTermPolicy::default(),
            booking_db: None,
            trivia_db: None,
            coffee_db: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn booking_db_path(&self) -> PathBuf {
        self.booking_db
            .clone()
            .unwrap_or_else(utils::booking_database_path)
    }

    pub fn trivia_db_path(&self) -> PathBuf {
        self.trivia_db
            .clone()
            .unwrap_or_else(utils::trivia_database_path)
    }

    pub fn coffee_db_path(&self) -> PathBuf {
        self.coffee_db
            .clone()
            .unwrap_or_else(utils::coffee_database_path)
    }

    /// Page size used by paginated listings; a zero in the file falls back to the default.
    pub fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> (Self, Option<ConfigError>) {
        Self::load_from(utils::config_path())
    }

    /// Falls back to defaults when the file cannot be read; the read error is
    /// handed back so the caller can report it once logging is up.
    pub fn load_from(path: PathBuf) -> (Self, Option<ConfigError>) {
        let (data, error) = match read_config(&path) {
            Ok(config) => (config, None),
            Err(err) => (AppConfig::default(), Some(err)),
        };
        let store = Self {
            path,
            data: Mutex::new(data),
        };
        (store, error)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> AppConfig {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("course-backends-{}-{name}", std::process::id()))
            .join("config.json")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (store, error) = ConfigStore::load_from(scratch_path("missing"));
        assert!(error.is_none());
        let config = store.read();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.effective_page_size(), 10);
    }

    #[test]
    fn update_persists_and_reloads() {
        let path = scratch_path("persist");
        let (store, _) = ConfigStore::load_from(path.clone());
        store
            .update(|config| {
                config.page_size = 25;
                config.empty_search = EmptyTermPolicy::Reject;
            })
            .expect("write config");

        let reloaded = ConfigStore::load_from(path.clone()).0.read();
        assert_eq!(reloaded.page_size, 25);
        assert_eq!(reloaded.empty_search, EmptyTermPolicy::Reject);
        let _ = fs::remove_dir_all(path.parent().expect("scratch dir"));
    }

    #[test]
    fn unreadable_file_reports_error_and_uses_defaults() {
        let path = scratch_path("corrupt");
        utils::ensure_parent(&path);
        fs::write(&path, "{ not json").expect("write corrupt config");

        let (store, error) = ConfigStore::load_from(path.clone());
        assert!(matches!(error, Some(ConfigError::Parse(_))));
        assert_eq!(store.read(), AppConfig::default());
        assert_eq!(store.path(), path.as_path());
        let _ = fs::remove_dir_all(path.parent().expect("scratch dir"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"empty_search":"reject"}"#).expect("parse partial config");
        assert_eq!(parsed.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(parsed.empty_search, EmptyTermPolicy::Reject);
        assert_eq!(parsed.log_filter, "info");
    }

    #[test]
    fn zero_page_size_falls_back() {
        let config = AppConfig {
            page_size: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.effective_page_size(), DEFAULT_PAGE_SIZE);
    }
}
