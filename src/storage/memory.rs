use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde_json::Value;

use crate::errors::{Result, VaultError};

use super::{Store, StoreName};

type Collections = BTreeMap<StoreName, BTreeMap<String, Value>>;

/// Volatile store used by tests and one-shot computations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| VaultError::Storage("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| VaultError::Storage("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn get_raw(&self, store: StoreName, id: &str) -> Result<Option<Value>> {
        Ok(self
            .read()?
            .get(&store)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn put_raw(&self, store: StoreName, id: &str, value: Value) -> Result<()> {
        self.write()?
            .entry(store)
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    fn delete_raw(&self, store: StoreName, id: &str) -> Result<()> {
        if let Some(records) = self.write()?.get_mut(&store) {
            records.remove(id);
        }
        Ok(())
    }

    fn get_all_raw(&self, store: StoreName) -> Result<Vec<Value>> {
        Ok(self
            .read()?
            .get(&store)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
