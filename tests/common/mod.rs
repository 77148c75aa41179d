#![allow(dead_code)]

use std::sync::Mutex;

use chrono::NaiveDate;
use finance_vault::{
    core::FixedClock,
    errors::{Result, VaultError},
    projection::ProjectionConfig,
    storage::{JsonStore, MemoryStore, Store, StoreName},
};
use once_cell::sync::Lazy;
use serde_json::Value;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn clock_on(y: i32, m: u32, d: u32) -> FixedClock {
    FixedClock::on(date(y, m, d))
}

pub fn projection_on(y: i32, m: u32, d: u32) -> ProjectionConfig {
    ProjectionConfig::new(&clock_on(y, m, d))
}

/// A JSON store rooted in a fresh temporary directory.
pub fn temp_json_store() -> JsonStore {
    let temp = TempDir::new().expect("create temp dir");
    let store = JsonStore::new(Some(temp.path().to_path_buf())).expect("open json store");
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    store
}

/// Memory store that refuses to write transactions for one stream.
pub struct FailingStore {
    inner: MemoryStore,
    broken_stream: String,
}

impl FailingStore {
    pub fn new(broken_stream: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            broken_stream: broken_stream.to_string(),
        }
    }
}

impl Store for FailingStore {
    fn get_raw(&self, store: StoreName, id: &str) -> Result<Option<Value>> {
        self.inner.get_raw(store, id)
    }

    fn put_raw(&self, store: StoreName, id: &str, value: Value) -> Result<()> {
        let targets_broken = value
            .get("stream_id")
            .and_then(Value::as_str)
            .is_some_and(|stream| stream == self.broken_stream);
        if store == StoreName::Transactions && targets_broken {
            return Err(VaultError::Storage("disk full".into()));
        }
        self.inner.put_raw(store, id, value)
    }

    fn delete_raw(&self, store: StoreName, id: &str) -> Result<()> {
        self.inner.delete_raw(store, id)
    }

    fn get_all_raw(&self, store: StoreName) -> Result<Vec<Value>> {
        self.inner.get_all_raw(store)
    }
}
