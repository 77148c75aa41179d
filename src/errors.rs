use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the storage, service, and runner layers.
///
/// The projection and balance layers are total and never produce one of these.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{store} record `{id}` not found")]
    NotFound { store: &'static str, id: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Field cannot be changed after creation: {0}")]
    ImmutableField(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No exchange rate available for {from} → {to}")]
    RateUnavailable { from: String, to: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = StdResult<T, VaultError>;

impl VaultError {
    pub fn not_found(store: &'static str, id: impl Into<String>) -> Self {
        VaultError::NotFound {
            store,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        VaultError::Validation(message.into())
    }
}
