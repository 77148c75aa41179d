use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde_json::Value;
use tracing::debug;

use crate::{
    errors::{Result, VaultError},
    utils::{app_data_dir, ensure_dir, write_atomic},
};

use super::{Store, StoreName};

const STORE_EXTENSION: &str = "json";

type Collection = BTreeMap<String, Value>;

/// Stores each collection as one pretty-printed JSON object keyed by id
/// under the data directory. Writes replace the file atomically.
#[derive(Debug)]
pub struct JsonStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        ensure_dir(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self, store: StoreName) -> PathBuf {
        self.root
            .join(format!("{}.{}", store.as_str(), STORE_EXTENSION))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| VaultError::Storage("json store lock poisoned".into()))
    }

    fn load(&self, store: StoreName) -> Result<Collection> {
        let path = self.store_path(store);
        if !path.exists() {
            return Ok(Collection::new());
        }
        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Collection::new());
        }
        serde_json::from_str(&data).map_err(|err| {
            VaultError::Storage(format!("{} is corrupted: {}", path.display(), err))
        })
    }

    fn save(&self, store: StoreName, collection: &Collection) -> Result<()> {
        let path = self.store_path(store);
        let json = serde_json::to_string_pretty(collection)?;
        write_atomic(&path, &json)?;
        debug!(store = %store, records = collection.len(), "store written");
        Ok(())
    }
}

impl Store for JsonStore {
    fn get_raw(&self, store: StoreName, id: &str) -> Result<Option<Value>> {
        let _guard = self.lock()?;
        Ok(self.load(store)?.remove(id))
    }

    fn put_raw(&self, store: StoreName, id: &str, value: Value) -> Result<()> {
        let _guard = self.lock()?;
        let mut collection = self.load(store)?;
        collection.insert(id.to_string(), value);
        self.save(store, &collection)
    }

    fn delete_raw(&self, store: StoreName, id: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut collection = self.load(store)?;
        if collection.remove(id).is_some() {
            self.save(store, &collection)?;
        }
        Ok(())
    }

    fn get_all_raw(&self, store: StoreName) -> Result<Vec<Value>> {
        let _guard = self.lock()?;
        Ok(self.load(store)?.into_values().collect())
    }
}
