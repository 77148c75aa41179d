//! Stream lifecycle: creation, edits, archival.

use tracing::info;

use crate::core::time::Clock;
use crate::errors::{Result, VaultError};
use crate::ledger::Stream;
use crate::storage::{IndexName, Store, StoreExt};

pub struct StreamService;

impl StreamService {
    pub fn create<S: Store + ?Sized>(store: &S, stream: Stream) -> Result<Stream> {
        Self::validate(&stream)?;
        store.put(&stream)?;
        info!(stream = %stream.id, name = %stream.name, "stream created");
        Ok(stream)
    }

    /// Replaces the editable fields of an existing stream. The base currency,
    /// identity and creation time always stay as first recorded.
    pub fn update<S: Store + ?Sized>(store: &S, replacement: Stream) -> Result<Stream> {
        let existing: Stream = store.fetch(&replacement.id)?;
        if existing.base_currency() != replacement.base_currency() {
            return Err(VaultError::ImmutableField(format!(
                "base currency of stream `{}` is {}",
                existing.id,
                existing.base_currency()
            )));
        }
        Self::validate(&replacement)?;
        let mut updated = replacement;
        updated.created_at = existing.created_at;
        store.put(&updated)?;
        Ok(updated)
    }

    /// Soft-deletes a stream; its transactions stay resolvable.
    pub fn archive<S: Store + ?Sized>(store: &S, id: &str, clock: &dyn Clock) -> Result<Stream> {
        let mut stream: Stream = store.fetch(id)?;
        if stream.archived_at.is_none() {
            stream.archived_at = Some(clock.now());
            store.put(&stream)?;
        }
        Ok(stream)
    }

    pub fn unarchive<S: Store + ?Sized>(store: &S, id: &str) -> Result<Stream> {
        let mut stream: Stream = store.fetch(id)?;
        stream.archived_at = None;
        store.put(&stream)?;
        Ok(stream)
    }

    /// Active streams sorted by creation time.
    pub fn list_active<S: Store + ?Sized>(store: &S) -> Result<Vec<Stream>> {
        let mut streams: Vec<Stream> =
            store.get_all_by_index(IndexName::StreamsByArchived, "false")?;
        streams.sort_by_key(|stream| stream.created_at);
        Ok(streams)
    }

    pub fn list_all<S: Store + ?Sized>(store: &S) -> Result<Vec<Stream>> {
        let mut streams: Vec<Stream> = store.get_all()?;
        streams.sort_by_key(|stream| stream.created_at);
        Ok(streams)
    }

    /// Looks a stream up by id, archived or not.
    pub fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<Stream>> {
        store.get(id)
    }

    /// Removes the stream record only. Transactions that reference it are the
    /// caller's to delete or reassign.
    pub fn delete<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
        store.delete::<Stream>(id)
    }

    fn validate(stream: &Stream) -> Result<()> {
        if stream.name.trim().is_empty() {
            return Err(VaultError::validation("stream requires a name"));
        }
        if stream.base_currency().is_empty() {
            return Err(VaultError::validation("stream requires a base currency"));
        }
        if let Some(limit) = stream.credit_limit() {
            if !limit.is_finite() || limit < 0.0 {
                return Err(VaultError::validation(format!(
                    "credit limit must be a non-negative number, got {}",
                    limit
                )));
            }
        }
        Ok(())
    }
}
