use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-records";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "school_records.sqlite";
const BACKUP_FILE_NAME: &str = "backup.json";
const EXPORT_FILE_NAME: &str = "records.csv";
const LOG_DIR_NAME: &str = "logs";

/// Overrides the data directory (useful for keeping separate record sets).
pub const HOME_ENV: &str = "SCHOOL_RECORDS_HOME";
/// Overrides the log level written to the log directory.
pub const LOG_LEVEL_ENV: &str = "SCHOOL_RECORDS_LOG";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Every on-disk location the application touches, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the data directory from `SCHOOL_RECORDS_HOME`, falling back to
    /// `~/.school-records`.
    pub fn resolve() -> Result<Self> {
        if let Some(dir) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::from_dir(PathBuf::from(dir)));
        }
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::from_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn from_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create the data and log directories if they are missing.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("failed to create data directory")?;
        fs::create_dir_all(self.log_dir()).context("failed to create log directory")?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn backup(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE_NAME)
    }

    pub fn export(&self) -> PathBuf {
        self.data_dir.join(EXPORT_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

/// Log level requested through the environment, or `info`.
pub fn log_level() -> String {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_the_data_dir() {
        let paths = AppPaths::from_dir("/tmp/records");
        assert_eq!(
            paths.database(),
            PathBuf::from("/tmp/records/school_records.sqlite")
        );
        assert_eq!(paths.backup(), PathBuf::from("/tmp/records/backup.json"));
        assert_eq!(paths.export(), PathBuf::from("/tmp/records/records.csv"));
        assert_eq!(paths.log_dir(), PathBuf::from("/tmp/records/logs"));
    }

    #[test]
    fn ensure_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_dir(dir.path().join("nested"));
        paths.ensure().unwrap();
        assert!(paths.data_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
