use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DurableStorage, StorageError};
use crate::config;

const STORAGE_FILE: &str = "session.json";
const STAGING_FILE: &str = "session.json.tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageFile {
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

impl Default for StorageFile {
    fn default() -> Self {
        Self {
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Resolve the client config directory, creating it when missing.
///
/// `VOD_CLIENT_CONFIG_DIR` wins; otherwise `$HOME/.config/vod/client`.
pub fn default_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Some(custom_dir) = &config::config().client.config_dir {
        custom_dir.clone()
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("vod").join("client")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Key-value entries persisted as pretty JSON in `<dir>/session.json`.
///
/// Every call re-reads the file so that another process (a second CLI
/// invocation, say) is observed. The in-process lock serializes the
/// read-modify-write cycle of `set` and `remove`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            path: dir.join(STORAGE_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dir = default_config_dir()?;
        Ok(Self::new(dir)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StorageFile, StorageError> {
        if !self.path.exists() {
            return Ok(StorageFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    /// Stage the new content next to the file and rename it into place, so
    /// a concurrent reader sees either the old file or the new one.
    fn save(&self, file: &StorageFile) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(file).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let staging = self.path.with_file_name(STAGING_FILE);
        fs::write(&staging, content)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;

        let mut file = match self.load() {
            Ok(file) => file,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!("Discarding corrupt storage file {}: {}", self.path.display(), reason);
                StorageFile::default()
            }
            Err(e) => return Err(e),
        };

        apply(&mut file.entries);
        file.updated_at = Utc::now();
        self.save(&file)
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
