use crate::domain::ports::ConfigStore;
use crate::utils::error::{ConfigError, Result};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl ConfigStore for FileStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let data = fs::read_to_string(path)?;
        Ok(data)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, contents)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }
}

/// Files kept in memory. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes and removals always fail.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Seeds a file regardless of the read-only flag.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Result<Self> {
        self.lock()?.insert(path.into(), contents.into());
        Ok(self)
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.lock().ok()?.get(path).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PathBuf, String>>> {
        self.files.lock().map_err(|e| ConfigError::StorageError {
            message: e.to_string(),
        })
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.read_only {
            return Err(ConfigError::IoError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("'{}' is on a read-only store", path.display()),
            )));
        }
        Ok(())
    }
}

impl ConfigStore for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.lock().map(|files| files.contains_key(path)).unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.lock()?.get(path).cloned().ok_or_else(|| {
            ConfigError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' does not exist", path.display()),
            ))
        })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.check_writable(path)?;
        self.lock()?.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        match self.lock()?.remove(path) {
            Some(_) => Ok(()),
            None => Err(ConfigError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' does not exist", path.display()),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("app.json");

        FileStore.write(&path, "{}").unwrap();

        assert!(FileStore.exists(&path));
        assert_eq!(FileStore.read_to_string(&path).unwrap(), "{}");

        FileStore.remove(&path).unwrap();
        assert!(!FileStore.exists(&path));
    }

    #[test]
    fn test_file_store_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        assert!(matches!(
            FileStore.read_to_string(&path),
            Err(ConfigError::IoError(_))
        ));
        assert!(FileStore.remove(&path).is_err());
    }

    #[test]
    fn test_memory_store_clones_share_files() {
        let store = MemoryStore::new();
        let other = store.clone();
        let path = Path::new("shared.json");

        store.write(path, r#"{"a":1}"#).unwrap();

        assert!(other.exists(path));
        assert_eq!(other.contents(path).as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_read_only_memory_store_rejects_writes() {
        let store = MemoryStore::read_only()
            .with_file("seed.json", "{}")
            .unwrap();
        let path = Path::new("seed.json");

        assert_eq!(store.read_to_string(path).unwrap(), "{}");
        assert!(store.write(path, "[]").is_err());
        assert!(store.remove(path).is_err());
        assert_eq!(store.contents(path).as_deref(), Some("{}"));
    }
}
