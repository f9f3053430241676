//! Local key/value stores for anonymous preferences.
//!
//! Values are stored as JSON text. Reading falls back to the raw string
//! when the stored text is not valid JSON, so values written by older
//! clients stay readable.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which an older client kept all of its data as one JSON blob.
pub const LEGACY_KEY: &str = "jStorage";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Store file is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw string storage plus JSON-aware accessors.
pub trait LocalStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Value for `key`. When absent, a value kept under `key` inside the
    /// legacy blob is returned instead. A legacy blob that parses is removed
    /// on this first read whether or not it held `key`; unparsable blobs
    /// are left in place.
    fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        if let Some(raw) = self.read(key)? {
            return Ok(Some(parse_lenient(raw)));
        }
        let Some(legacy) = self.read(LEGACY_KEY)? else {
            return Ok(None);
        };
        let Ok(mut blob) = serde_json::from_str::<Value>(&legacy) else {
            return Ok(None);
        };
        self.remove(LEGACY_KEY)?;
        let migrated = blob.get_mut(key).map(Value::take);
        if migrated.is_some() {
            log::info!("LocalStore: migrated '{key}' out of legacy storage");
        }
        Ok(migrated)
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.write(key, &text)
    }
}

fn parse_lenient(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Volatile store, for tests and hosts without a writable disk.
#[derive(Clone, Debug, Default)]
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

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file (`{ "key": "value", ... }`).
///
/// The file is read on every access and rewritten on every change; it is
/// meant for a handful of small entries.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LocalStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.store(&entries)?;
        }
        Ok(())
    }
}
