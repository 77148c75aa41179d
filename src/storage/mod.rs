pub mod json_backend;
pub mod memory;

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    currency::RateEntry,
    errors::{Result, VaultError},
    ledger::{Automation, Recurrence, Stream, Transaction},
};

pub use json_backend::JsonStore;
pub use memory::MemoryStore;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Logical record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreName {
    Streams,
    Transactions,
    Recurrences,
    Automations,
    ExchangeRates,
}

impl StoreName {
    pub const ALL: [StoreName; 5] = [
        StoreName::Streams,
        StoreName::Transactions,
        StoreName::Recurrences,
        StoreName::Automations,
        StoreName::ExchangeRates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreName::Streams => "streams",
            StoreName::Transactions => "transactions",
            StoreName::Recurrences => "recurrences",
            StoreName::Automations => "automations",
            StoreName::ExchangeRates => "exchange_rates",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary lookups a backend answers through `get_all_by_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    TransactionsByStream,
    TransactionsByApplicabilityDate,
    TransactionsByRecurrence,
    StreamsByArchived,
    RecurrencesByStream,
    RatesByCurrencyPair,
    RatesByDate,
}

impl IndexName {
    pub fn store(&self) -> StoreName {
        match self {
            IndexName::TransactionsByStream
            | IndexName::TransactionsByApplicabilityDate
            | IndexName::TransactionsByRecurrence => StoreName::Transactions,
            IndexName::StreamsByArchived => StoreName::Streams,
            IndexName::RecurrencesByStream => StoreName::Recurrences,
            IndexName::RatesByCurrencyPair | IndexName::RatesByDate => StoreName::ExchangeRates,
        }
    }
}

/// A persisted entity: which store it lives in, its key, and the keys it
/// carries for each index of that store.
pub trait Record: Serialize + DeserializeOwned {
    const STORE: StoreName;

    fn id(&self) -> &str;

    fn index_key(&self, _index: IndexName) -> Option<String> {
        None
    }
}

impl Record for Stream {
    const STORE: StoreName = StoreName::Streams;

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: IndexName) -> Option<String> {
        match index {
            IndexName::StreamsByArchived => Some(self.is_archived().to_string()),
            _ => None,
        }
    }
}

impl Record for Transaction {
    const STORE: StoreName = StoreName::Transactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: IndexName) -> Option<String> {
        match index {
            IndexName::TransactionsByStream => Some(self.stream_id.clone()),
            IndexName::TransactionsByApplicabilityDate => {
                Some(self.applicability_date.format(DATE_KEY_FORMAT).to_string())
            }
            IndexName::TransactionsByRecurrence => self.recurrence_id.clone(),
            _ => None,
        }
    }
}

impl Record for Recurrence {
    const STORE: StoreName = StoreName::Recurrences;

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: IndexName) -> Option<String> {
        match index {
            IndexName::RecurrencesByStream => Some(self.stream_id.clone()),
            _ => None,
        }
    }
}

impl Record for Automation {
    const STORE: StoreName = StoreName::Automations;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for RateEntry {
    const STORE: StoreName = StoreName::ExchangeRates;

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: IndexName) -> Option<String> {
        match index {
            IndexName::RatesByCurrencyPair => Some(self.pair_key()),
            IndexName::RatesByDate => Some(self.date.format(DATE_KEY_FORMAT).to_string()),
            _ => None,
        }
    }
}

/// Key-value persistence over JSON documents, one collection per store.
pub trait Store: Send + Sync {
    fn get_raw(&self, store: StoreName, id: &str) -> Result<Option<Value>>;
    fn put_raw(&self, store: StoreName, id: &str, value: Value) -> Result<()>;
    fn delete_raw(&self, store: StoreName, id: &str) -> Result<()>;
    fn get_all_raw(&self, store: StoreName) -> Result<Vec<Value>>;
}

/// Typed access over any [`Store`].
pub trait StoreExt: Store {
    fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        match self.get_raw(R::STORE, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Like [`StoreExt::get`] but a missing record is an error.
    fn fetch<R: Record>(&self, id: &str) -> Result<R> {
        self.get(id)?
            .ok_or_else(|| VaultError::not_found(R::STORE.as_str(), id))
    }

    fn put<R: Record>(&self, record: &R) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.put_raw(R::STORE, record.id(), value)
    }

    fn delete<R: Record>(&self, id: &str) -> Result<()> {
        self.delete_raw(R::STORE, id)
    }

    fn get_all<R: Record>(&self) -> Result<Vec<R>> {
        self.get_all_raw(R::STORE)?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(VaultError::from))
            .collect()
    }

    fn get_all_by_index<R: Record>(&self, index: IndexName, key: &str) -> Result<Vec<R>> {
        if index.store() != R::STORE {
            return Err(VaultError::Storage(format!(
                "index {:?} does not belong to store {}",
                index,
                R::STORE
            )));
        }
        Ok(self
            .get_all::<R>()?
            .into_iter()
            .filter(|record| record.index_key(index).as_deref() == Some(key))
            .collect())
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
