use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type Tables = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt value for '{scope}/{key}'")]
    Corrupt { scope: String, key: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Durable `(scope, key) -> bytes` mapping.
///
/// Implementations serialize concurrent access internally.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, scope: &str, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn keys(&self, scope: &str) -> Result<Vec<String>, StoreError>;
    fn delete(&self, scope: &str, key: &str) -> Result<bool, StoreError>;
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, StoreError> {
    tables.lock().map_err(|_| StoreError::Poisoned)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let tables = lock(&self.tables)?;
        Ok(tables.get(scope).and_then(|t| t.get(key)).cloned())
    }

    fn set(&self, scope: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut tables = lock(&self.tables)?;
        tables
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn keys(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .get(scope)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut tables = lock(&self.tables)?;
        let Some(table) = tables.get_mut(scope) else {
            return Ok(false);
        };
        let removed = table.remove(key).is_some();
        if table.is_empty() {
            tables.remove(scope);
        }
        Ok(removed)
    }
}

/// Store persisted as a single JSON document of hex-encoded values.
///
/// Every mutation rewrites the whole file through a temporary sibling, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.is_file() {
            let data = fs::read(&path)?;
            if data.is_empty() {
                Tables::new()
            } else {
                decode_tables(serde_json::from_slice(&data)?)?
            }
        } else {
            Tables::new()
        };
        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, tables: &Tables) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded: BTreeMap<&str, BTreeMap<&str, String>> = tables
            .iter()
            .map(|(scope, table)| {
                let values = table
                    .iter()
                    .map(|(key, value)| (key.as_str(), hex::encode(value)))
                    .collect();
                (scope.as_str(), values)
            })
            .collect();
        let data = serde_json::to_vec_pretty(&encoded)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn decode_tables(raw: BTreeMap<String, BTreeMap<String, String>>) -> Result<Tables, StoreError> {
    let mut tables = Tables::new();
    for (scope, values) in raw {
        let mut table = BTreeMap::new();
        for (key, value) in values {
            let bytes = hex::decode(&value).map_err(|_| StoreError::Corrupt {
                scope: scope.clone(),
                key: key.clone(),
            })?;
            table.insert(key, bytes);
        }
        tables.insert(scope, table);
    }
    Ok(tables)
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let tables = lock(&self.tables)?;
        Ok(tables.get(scope).and_then(|t| t.get(key)).cloned())
    }

    fn set(&self, scope: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut tables = lock(&self.tables)?;
        let previous = tables
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        if previous.as_deref() == Some(value) {
            return Ok(());
        }
        self.flush(&tables)
    }

    fn keys(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .get(scope)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut tables = lock(&self.tables)?;
        let Some(table) = tables.get_mut(scope) else {
            return Ok(false);
        };
        if table.remove(key).is_none() {
            return Ok(false);
        }
        if table.is_empty() {
            tables.remove(scope);
        }
        self.flush(&tables)?;
        Ok(true)
    }
}

/// Moves every key of `from` under `to`, then clears `from`.
///
/// Returns the number of keys moved.
pub fn migrate_scope(store: &dyn KeyValueStore, from: &str, to: &str) -> Result<usize, StoreError> {
    if from == to {
        return Ok(0);
    }
    let keys = store.keys(from)?;
    for key in &keys {
        if let Some(value) = store.get(from, key)? {
            store.set(to, key, &value)?;
        }
    }
    for key in &keys {
        store.delete(from, key)?;
    }
    if !keys.is_empty() {
        log::debug!("migrated {} key(s) from '{from}' to '{to}'", keys.len());
    }
    Ok(keys.len())
}

/// A store view bound to a single scope, handed to widgets.
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn KeyValueStore>,
    scope: String,
}

impl ScopedStore {
    pub fn new(store: Arc<dyn KeyValueStore>, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn rebind(&mut self, scope: impl Into<String>) {
        self.scope = scope.into();
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.get(&self.scope, key)
    }

    pub fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.store.set(&self.scope, key, value)
    }

    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.store.delete(&self.scope, key)
    }

    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.store.keys(&self.scope)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec(value)?;
        self.set(key, &data)
    }
}

impl std::fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum StoreKind {
    Memory,
    JsonFile(PathBuf),
}

pub struct StoreFactory;

impl StoreFactory {
    pub fn open(kind: &StoreKind) -> Result<Arc<dyn KeyValueStore>, StoreError> {
        match kind {
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreKind::JsonFile(path) => Ok(Arc::new(JsonFileStore::open(path)?)),
        }
    }
}
