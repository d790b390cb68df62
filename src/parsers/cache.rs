use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::store::SnapshotStore;
use super::SourceRecord;
use crate::config::AnalysisConfig;
use crate::error::CacheError;

/// Key the whole cache snapshot is persisted under until the cache is bound
/// to a workspace.
pub const SNAPSHOT_KEY: &str = "codemap.cache";

/// Snapshot key for one workspace root, so runs over different roots never
/// share a snapshot.
pub fn workspace_key(root: &Path) -> String {
    let digest = hash_bytes(root.to_string_lossy().as_bytes());
    format!("{SNAPSHOT_KEY}.{}", &digest[..16])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub content_hash: String,
    pub payload: SourceRecord,
    /// Milliseconds since the Unix epoch.
    pub stored_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub snapshot_bytes: usize,
}

/// Content-hash validated memo of parse results, written through to a
/// [`SnapshotStore`] on every change.
///
/// Two caches writing the same key of one store overwrite each other. The
/// pipeline binds its cache to [`workspace_key`] and serialises runs per
/// workspace, which keeps concurrent runs on distinct roots apart.
pub struct ContentCache {
    entries: BTreeMap<PathBuf, CacheEntry>,
    store: Box<dyn SnapshotStore>,
    key: String,
    enabled: bool,
    max_age: Duration,
}

impl ContentCache {
    pub fn new(config: &AnalysisConfig, store: Box<dyn SnapshotStore>) -> Self {
        let mut cache = Self {
            entries: BTreeMap::new(),
            store,
            key: SNAPSHOT_KEY.to_string(),
            enabled: config.cache_enabled,
            max_age: config.max_cache_age(),
        };

        if cache.enabled {
            cache.load();
        }

        cache
    }

    /// Switches to the snapshot stored under `key`, reloading entries when it
    /// differs from the current one.
    pub fn bind(&mut self, key: &str) {
        if self.key == key {
            return;
        }
        self.key = key.to_string();
        self.entries.clear();
        if self.enabled {
            self.load();
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn load(&mut self) {
        let data = match self.store.read(&self.key) {
            Ok(Some(data)) => data,
            Ok(None) => return,
            Err(err) => {
                warn!("Failed to read cache snapshot: {err}");
                return;
            }
        };

        match bincode::deserialize::<Vec<CacheEntry>>(&data) {
            Ok(entries) => {
                let now = now_millis();
                let live: BTreeMap<PathBuf, CacheEntry> = entries
                    .into_iter()
                    .filter(|entry| !self.is_expired(entry, now))
                    .map(|entry| (entry.path.clone(), entry))
                    .collect();
                self.entries = live;
                debug!(entries = self.entries.len(), "loaded cache snapshot");
            }
            Err(err) => {
                warn!("Discarding unreadable cache snapshot: {err}");
            }
        }
    }

    /// Cached record for `path`, or `None` when caching is disabled, nothing
    /// is stored, the file changed since it was stored, or the entry expired.
    /// Stale and expired entries are evicted on the way out.
    pub fn get(&mut self, path: &Path) -> Option<SourceRecord> {
        if !self.enabled {
            return None;
        }

        let entry = self.entries.get(path)?;

        let current_hash = hash_file(path);
        if current_hash.is_empty() || current_hash != entry.content_hash {
            debug!(path = %path.display(), "cache entry stale");
            self.entries.remove(path);
            return None;
        }

        if self.is_expired(entry, now_millis()) {
            debug!(path = %path.display(), "cache entry expired");
            self.entries.remove(path);
            return None;
        }

        Some(entry.payload.clone())
    }

    /// Stores `record` against the file's current hash and persists the
    /// whole snapshot before returning.
    pub fn set(&mut self, path: &Path, record: SourceRecord) -> Result<(), CacheError> {
        self.set_with_hash(path, hash_file(path), record)
    }

    /// Stores `record` against `content_hash`, the hash of the bytes it was
    /// parsed from. A file edited after parsing then misses on the next get.
    ///
    /// Paths that are not valid UTF-8 are not cached. A failed write leaves
    /// the in-memory entries as they were.
    pub fn set_with_hash(
        &mut self,
        path: &Path,
        content_hash: String,
        record: SourceRecord,
    ) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }
        if path.to_str().is_none() {
            debug!(path = %path.display(), "not caching non UTF-8 path");
            return Ok(());
        }

        let entry = CacheEntry {
            path: path.to_path_buf(),
            content_hash,
            payload: record,
            stored_at: now_millis(),
        };
        let previous = self.entries.insert(path.to_path_buf(), entry);

        if let Err(err) = self.persist() {
            match previous {
                Some(previous) => self.entries.insert(path.to_path_buf(), previous),
                None => self.entries.remove(path),
            };
            return Err(err);
        }
        Ok(())
    }

    pub fn invalidate(&mut self, path: &Path) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }

        self.entries.remove(path);
        self.persist()
    }

    /// Drops every entry and erases the persisted snapshot.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        self.store.remove(&self.key)
    }

    pub fn stats(&self) -> CacheStats {
        let snapshot_bytes = self
            .encode()
            .map(|data| data.len())
            .unwrap_or_default();
        CacheStats {
            entries: self.entries.len(),
            snapshot_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn persist(&self) -> Result<(), CacheError> {
        let data = self.encode()?;
        self.store.write(&self.key, &data)
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let entries: Vec<&CacheEntry> = self.entries.values().collect();
        Ok(bincode::serialize(&entries)?)
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        let age = now.saturating_sub(entry.stored_at);
        age > 0 && age as u128 > self.max_age.as_millis()
    }
}

/// SHA-256 of the file's raw bytes, hex encoded. Unreadable files hash to the
/// empty string, which never validates a cache entry.
pub fn hash_file(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => hash_bytes(&bytes),
        Err(_) => String::new(),
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256_and_empty_for_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "abc").unwrap();

        assert_eq!(
            hash_file(&file),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_file(&dir.path().join("missing.ts")), "");
    }

    #[test]
    fn workspace_keys_are_stable_and_distinct() {
        let key = workspace_key(Path::new("/ws/app"));
        assert!(key.starts_with("codemap.cache."));
        assert_eq!(key, workspace_key(Path::new("/ws/app")));
        assert_ne!(key, workspace_key(Path::new("/ws/lib")));
    }
}
