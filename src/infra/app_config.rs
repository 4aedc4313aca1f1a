use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing the `reviews` table.
    pub database_path: Option<PathBuf>,
    /// Turn on `PRAGMA foreign_keys`. Requires the referenced `employee`
    /// table to exist in the same database.
    pub enforce_foreign_keys: bool,
}

impl AppConfig {
    /// Database file to open: `$REVIEW_RECORDS_DB_PATH`, then the configured
    /// path, then `db.sqlite` in the data directory.
    pub fn resolved_database_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("REVIEW_RECORDS_DB_PATH") {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        app_data_dir().join("db.sqlite")
    }
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Read a config file; a missing or malformed file yields the defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring malformed config at {}: {}", path.display(), err);
            AppConfig::default()
        }
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REVIEW_RECORDS_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

pub fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("REVIEW_RECORDS_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("ReviewRecords");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("ReviewRecords");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("review-records");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("review-records");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".review-records")
}
