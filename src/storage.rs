//! Persistent key-value store for the client session.
//!
//! Plays the role browser local storage plays for a web dashboard: a flat
//! string map, read synchronously, written whole. The file-backed store
//! replaces its JSON file through a temp file + rename so a crash never
//! leaves half a session on disk.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Errors from session storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt session store: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// Flat string key-value store.
///
/// Multi-key writes are all-or-nothing.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

// ═══════════════════════════════════════════════════════════
// FileStore
// ═══════════════════════════════════════════════════════════

/// JSON file store (`{"medsafe_token": "...", ...}`).
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        let json = serde_json::to_vec_pretty(map)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut map = self.load()?;
        if apply(&mut map) {
            self.save(&map)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.modify(|map| {
            for (k, v) in entries {
                map.insert((*k).to_string(), (*v).to_string());
            }
            true
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.modify(|map| {
            let mut changed = false;
            for k in keys {
                changed |= map.remove(*k).is_some();
            }
            changed
        })
    }
}

// ═══════════════════════════════════════════════════════════
// MemoryStore
// ═══════════════════════════════════════════════════════════

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = self.map.lock().map_err(|_| StorageError::LockPoisoned)?;
        for (k, v) in entries {
            map.insert((*k).to_string(), (*v).to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.map.lock().map_err(|_| StorageError::LockPoisoned)?;
        for k in keys {
            map.remove(*k);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        assert_eq!(store.get("medsafe_token").unwrap(), None);
    }

    #[test]
    fn set_all_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::new(&path);
        store
            .set_all(&[("medsafe_token", "tok"), ("medsafe_role", "admin")])
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("medsafe_token").unwrap().as_deref(), Some("tok"));
        assert_eq!(reopened.get("medsafe_role").unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn remove_all_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store
            .set_all(&[("medsafe_token", "tok"), ("theme", "dark")])
            .unwrap();

        store.remove_all(&["medsafe_token", "medsafe_email"]).unwrap();

        assert_eq!(store.get("medsafe_token").unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn remove_on_missing_file_does_not_create_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::new(&path);
        store.remove_all(&["medsafe_token"]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.get("medsafe_token"), Err(StorageError::Json(_))));
    }

    #[test]
    fn blank_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "\n").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get("medsafe_role").unwrap(), None);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set_all(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(store.len(), 2);
        store.remove_all(&["a"]).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }
}
