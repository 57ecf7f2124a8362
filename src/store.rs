use log::{debug, error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keys shared by everything that reads or writes the store.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const FONT_SIZE: &str = "fontSize";
    pub const LAST_CHAPTER: &str = "lastChapter";

    /// Cache entries are scoped by format version so a version bump orphans
    /// every previously cached chapter.
    pub fn chapter_cache(version: &str, chapter: u32) -> String {
        format!("chapter-{version}-{chapter}")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store file {path:?} is not a JSON object: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Small string key-value store. Writes are assumed to succeed; adapters
/// log failures instead of surfacing them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed JSON under store key '{key}': {e}");
            None
        }
    }
}

pub fn set_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => error!("Failed to serialize value for store key '{key}': {e}"),
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// JSON-object file on disk, rewritten after every mutation.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened store {:?} with {} entries", path, entries.len());
        Ok(Self { path, entries })
    }

    /// Falls back to an empty store when the file is unreadable, so a corrupt
    /// store never keeps the reader from starting.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => store,
            Err(e) => {
                error!("{e}; starting with an empty store");
                Self {
                    path,
                    entries: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let content = match serde_json::to_string_pretty(&self.entries) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to serialize store {:?}: {}", self.path, e);
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create store directory {:?}: {}", parent, e);
                    return;
                }
            }
        }
        if let Err(e) = fs::write(&self.path, content) {
            error!("Failed to write store {:?}: {}", self.path, e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cache_key_includes_version() {
        assert_eq!(keys::chapter_cache("v2", 7), "chapter-v2-7");
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set(keys::THEME, "dark");
        store.set(keys::LAST_CHAPTER, "4");
        store.remove(keys::LAST_CHAPTER);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::THEME).as_deref(), Some("dark"));
        assert_eq!(reopened.get(keys::LAST_CHAPTER), None);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Parse { .. })));
        let store = FileStore::open_or_empty(&path);
        assert_eq!(store.get(keys::THEME), None);
    }

    #[test]
    fn json_helpers_skip_malformed_values() {
        let mut store = MemoryStore::new();
        set_json(&mut store, "names", &vec!["a", "b"]);
        let names: Option<Vec<String>> = get_json(&store, "names");
        assert_eq!(names, Some(vec!["a".to_string(), "b".to_string()]));

        store.set("broken", "{");
        let broken: Option<Vec<String>> = get_json(&store, "broken");
        assert!(broken.is_none());
    }
}
