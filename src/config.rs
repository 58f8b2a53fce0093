//! Config module - Session persistence and start-up options
//!
//! The session record is a small JSON object written when the window
//! closes and read back on the next start.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::file_ops::BACKUP_DIR_NAME;
use crate::session::SessionOptions;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Persisted session record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub current_index: i64,
    #[serde(default)]
    pub folder1: String,
    #[serde(default)]
    pub folder2: String,
}

/// Read a saved session. A missing file is not an error.
pub fn load_session(path: &Path) -> Result<Option<SessionConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_session(path: &Path, config: &SessionConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Everything the application needs to start
#[derive(Debug, Clone)]
pub struct SorterOptions {
    /// Starting point of folder dialogs and parent of the backup folder
    pub working_root: PathBuf,
    pub backup_dir: PathBuf,
    /// `None` disables loading and saving the session record
    pub config_path: Option<PathBuf>,
    /// Folders to open at start, overriding the saved session
    pub initial_folders: [Option<PathBuf>; 2],
    pub session: SessionOptions,
}

impl SorterOptions {
    pub fn new(working_root: PathBuf) -> Self {
        Self {
            backup_dir: working_root.join(BACKUP_DIR_NAME),
            working_root,
            config_path: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            initial_folders: [None, None],
            session: SessionOptions::default(),
        }
    }
}

impl Default for SorterOptions {
    fn default() -> Self {
        Self::new(default_working_root())
    }
}

/// Pictures folder, then home, then the current directory
pub fn default_working_root() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_session_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let original = SessionConfig {
            current_index: 2,
            folder1: "/a".to_string(),
            folder2: "/b".to_string(),
        };

        save_session(&path, &original).unwrap();
        let restored = load_session(&path).unwrap().unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_wire_field_names() {
        let config = SessionConfig {
            current_index: 2,
            folder1: "/a".to_string(),
            folder2: "/b".to_string(),
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["currentIndex"], 2);
        assert_eq!(value["folder1"], "/a");
        assert_eq!(value["folder2"], "/b");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"folder1": "/a"}"#).unwrap();
        assert_eq!(config.current_index, 0);
        assert_eq!(config.folder1, "/a");
        assert!(config.folder2.is_empty());
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempdir().unwrap();
        assert!(load_session(&dir.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        let err = load_session(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_backup_dir_follows_working_root() {
        let options = SorterOptions::new(PathBuf::from("/data/photos"));
        assert_eq!(options.backup_dir, PathBuf::from("/data/photos/false-positive"));
        assert_eq!(options.config_path, Some(PathBuf::from("config.json")));
    }
}
