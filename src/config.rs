//! Configuration for opening a jot log

use crate::error::{JotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default log file name, relative to the working directory
pub const DEFAULT_PATH: &str = "jot.bin";

/// How a [`crate::JotFile`] opens and writes its log
///
/// Loaded from TOML; every key is optional.
///
/// ```toml
/// path = "/home/me/notes/jot.bin"
/// lock = true
/// sync_writes = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JotConfig {
    /// Log file location
    pub path: PathBuf,

    /// Hold an exclusive advisory lock on the file while it is open
    pub lock: bool,

    /// fsync after every mutating operation
    pub sync_writes: bool,
}

impl Default for JotConfig {
    fn default() -> Self {
        JotConfig {
            path: PathBuf::from(DEFAULT_PATH),
            lock: true,
            sync_writes: false,
        }
    }
}

impl JotConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JotConfig {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| JotError::Config(e.to_string()))
    }

    /// Load a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JotConfig::default();
        assert_eq!(config.path, PathBuf::from("jot.bin"));
        assert!(config.lock);
        assert!(!config.sync_writes);
    }

    #[test]
    fn test_partial_toml() {
        let config = JotConfig::from_toml_str("sync_writes = true").unwrap();
        assert!(config.sync_writes);
        assert!(config.lock);
        assert_eq!(config.path, PathBuf::from(DEFAULT_PATH));
    }

    #[test]
    fn test_full_toml() {
        let config = JotConfig::from_toml_str(
            r#"
            path = "/tmp/notes.bin"
            lock = false
            sync_writes = true
            "#,
        )
        .unwrap();
        assert_eq!(config, JotConfig::new("/tmp/notes.bin").with_lock(false).with_sync_writes(true));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            JotConfig::from_toml_str("compact = true"),
            Err(JotError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jot.toml");
        std::fs::write(&path, "lock = false\n").unwrap();

        let config = JotConfig::load(&path).unwrap();
        assert!(!config.lock);
    }
}
