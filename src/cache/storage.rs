// Key/value storage backends for the cache store.
// File-backed storage with an in-memory fallback when the cache directory is unusable.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{FolioError, Result};

use super::paths::key_path;

/// Raw string storage keyed by name.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Stores each key as a JSON file in a directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory and prove it accepts writes.
    fn probe(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let probe = self.dir.join(".probe");
        fs::write(&probe, b"ok")?;
        fs::remove_file(&probe)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = key_path(&self.dir, key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = key_path(&self.dir, key);

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = key_path(&self.dir, key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Process-lifetime storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| FolioError::Other("memory storage poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| FolioError::Other("memory storage poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| FolioError::Other("memory storage poisoned".to_string()))?;
        items.remove(key);
        Ok(())
    }
}

/// Storage that never retains anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl Storage for NoopStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// Pick a storage backend at startup.
///
/// File storage is used when `dir` is known and writable; otherwise the
/// cache lives in memory for the rest of the session.
pub fn select_storage(dir: Option<PathBuf>) -> Box<dyn Storage> {
    let Some(dir) = dir else {
        warn!("no cache directory available, caching in memory");
        return Box::new(MemoryStorage::new());
    };

    let storage = FileStorage::new(dir);
    match storage.probe() {
        Ok(()) => {
            debug!(dir = %storage.dir().display(), "using file storage");
            Box::new(storage)
        }
        Err(e) => {
            warn!(dir = %storage.dir().display(), error = %e, "cache directory unusable, caching in memory");
            Box::new(MemoryStorage::new())
        }
    }
}
