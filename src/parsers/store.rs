use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CacheError;

/// Persisted key-value storage backing the content cache snapshot.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Store {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Store under the system temp directory, shared by every run on this machine.
    pub fn default_location() -> Result<Self, CacheError> {
        Self::new(std::env::temp_dir().join("codemap_cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.bincode"))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Store {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.key_path(key);
        let staging = path.with_extension("bincode.tmp");
        let to_store_error = |source| CacheError::Store {
            key: key.to_string(),
            source,
        };

        // Readers never observe a half-written snapshot.
        fs::write(&staging, value).map_err(to_store_error)?;
        fs::rename(&staging, &path).map_err(to_store_error)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Store {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
