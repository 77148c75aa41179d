//! Business logic helpers for recording and querying transactions.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::core::time::Clock;
use crate::errors::{Result, VaultError};
use crate::ledger::{NewTransaction, Stream, Transaction, TransactionKind};
use crate::storage::{IndexName, Store, StoreExt};

/// Provides validated CRUD helpers for persisted transactions.
pub struct TransactionService;

impl TransactionService {
    /// Records a new transaction. On credit-card streams the card's usage
    /// moves with it, clamped to `[0, credit_limit]`; a failed usage update
    /// is logged and does not undo the transaction.
    pub fn create<S: Store + ?Sized>(
        store: &S,
        draft: NewTransaction,
        clock: &dyn Clock,
    ) -> Result<Transaction> {
        Self::validate(&draft)?;
        let transaction = Transaction::record(draft, clock.now());
        store.put(&transaction)?;
        if let Err(err) = Self::apply_credit_usage(store, &transaction) {
            warn!(
                transaction = %transaction.id,
                stream = %transaction.stream_id,
                error = %err,
                "failed to update card usage after transaction create"
            );
        }
        Ok(transaction)
    }

    fn apply_credit_usage<S: Store + ?Sized>(store: &S, transaction: &Transaction) -> Result<()> {
        let Some(mut stream) = store.get::<Stream>(&transaction.stream_id)? else {
            return Ok(());
        };
        let Some(limit) = stream.credit_limit() else {
            return Ok(());
        };
        let delta = match transaction.kind {
            TransactionKind::Expense => transaction.amount,
            TransactionKind::Income => -transaction.amount,
        };
        let usage = (stream.usage_baseline() + delta).max(0.0).min(limit);
        debug!(stream = %stream.id, usage, "card usage updated");
        stream.current_usage = Some(usage);
        store.put(&stream)
    }

    pub fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<Transaction>> {
        store.get(id)
    }

    pub fn list<S: Store + ?Sized>(store: &S) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = store.get_all()?;
        transactions.sort_by_key(|txn| txn.applicability_date);
        Ok(transactions)
    }

    pub fn find_by_stream<S: Store + ?Sized>(store: &S, stream_id: &str) -> Result<Vec<Transaction>> {
        store.get_all_by_index(IndexName::TransactionsByStream, stream_id)
    }

    pub fn find_by_recurrence<S: Store + ?Sized>(
        store: &S,
        recurrence_id: &str,
    ) -> Result<Vec<Transaction>> {
        store.get_all_by_index(IndexName::TransactionsByRecurrence, recurrence_id)
    }

    /// Transactions effective within `[from, to]`.
    pub fn find_by_date_range<S: Store + ?Sized>(
        store: &S,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        Ok(Self::list(store)?
            .into_iter()
            .filter(|txn| txn.applicability_date >= from && txn.applicability_date <= to)
            .collect())
    }

    /// Transactions effective on or before `date`.
    pub fn money_in_hand<S: Store + ?Sized>(store: &S, date: NaiveDate) -> Result<Vec<Transaction>> {
        Ok(Self::list(store)?
            .into_iter()
            .filter(|txn| txn.applicability_date <= date)
            .collect())
    }

    /// Recorded transactions effective after `date`.
    pub fn projected<S: Store + ?Sized>(store: &S, date: NaiveDate) -> Result<Vec<Transaction>> {
        Ok(Self::list(store)?
            .into_iter()
            .filter(|txn| txn.applicability_date > date)
            .collect())
    }

    /// Most recently recorded first.
    pub fn recent<S: Store + ?Sized>(store: &S, limit: usize) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = store.get_all()?;
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.truncate(limit);
        Ok(transactions)
    }

    /// Updates the transaction identified by `id` via the provided mutator.
    /// Identity and record time are preserved.
    pub fn update<S, F>(store: &S, id: &str, mutator: F) -> Result<Transaction>
    where
        S: Store + ?Sized,
        F: FnOnce(&mut Transaction),
    {
        let existing: Transaction = store.fetch(id)?;
        let mut updated = existing.clone();
        mutator(&mut updated);
        updated.id = existing.id;
        updated.created_at = existing.created_at;
        updated.amount = updated.amount.abs();
        store.put(&updated)?;
        Ok(updated)
    }

    pub fn delete<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
        store.delete::<Transaction>(id)
    }

    /// Deletes every transaction spawned from `recurrence_id`, returning how many.
    pub fn delete_by_recurrence<S: Store + ?Sized>(store: &S, recurrence_id: &str) -> Result<usize> {
        let linked = Self::find_by_recurrence(store, recurrence_id)?;
        for txn in &linked {
            store.delete::<Transaction>(&txn.id)?;
        }
        Ok(linked.len())
    }

    fn validate(draft: &NewTransaction) -> Result<()> {
        if draft.stream_id.trim().is_empty() {
            return Err(VaultError::validation("transaction requires a stream"));
        }
        if !draft.amount.is_finite() {
            return Err(VaultError::validation("transaction amount must be a number"));
        }
        if draft.currency.is_empty() {
            return Err(VaultError::validation("transaction requires a currency"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::currency::CurrencyCode;
    use crate::storage::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(stream: &str, kind: TransactionKind, amount: f64, day: NaiveDate) -> NewTransaction {
        NewTransaction::new(stream, kind, amount, CurrencyCode::new("USD"), day)
    }

    #[test]
    fn card_usage_is_clamped_on_create() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(date(2025, 1, 1));
        let card = Stream::credit_card("Visa", CurrencyCode::new("USD"), 200.0, 150.0).with_id("card");
        store.put(&card).unwrap();

        TransactionService::create(&store, draft("card", TransactionKind::Expense, 100.0, date(2025, 1, 1)), &clock).unwrap();
        let card: Stream = store.fetch("card").unwrap();
        assert_eq!(card.current_usage, Some(200.0));

        TransactionService::create(&store, draft("card", TransactionKind::Income, 500.0, date(2025, 1, 2)), &clock).unwrap();
        let card: Stream = store.fetch("card").unwrap();
        assert_eq!(card.current_usage, Some(0.0));
    }

    #[test]
    fn regular_streams_are_left_alone() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(date(2025, 1, 1));
        let bank = Stream::new("Bank", "bank", CurrencyCode::new("USD")).with_id("bank");
        store.put(&bank).unwrap();
        TransactionService::create(&store, draft("bank", TransactionKind::Expense, 10.0, date(2025, 1, 1)), &clock).unwrap();
        let bank: Stream = store.fetch("bank").unwrap();
        assert_eq!(bank.current_usage, None);
    }

    #[test]
    fn date_range_and_partitions() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(date(2025, 1, 1));
        for day in [1, 10, 20] {
            TransactionService::create(&store, draft("s", TransactionKind::Income, 1.0, date(2025, 1, day)), &clock).unwrap();
        }
        assert_eq!(TransactionService::find_by_date_range(&store, date(2025, 1, 1), date(2025, 1, 10)).unwrap().len(), 2);
        assert_eq!(TransactionService::money_in_hand(&store, date(2025, 1, 10)).unwrap().len(), 2);
        assert_eq!(TransactionService::projected(&store, date(2025, 1, 10)).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_identity() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(date(2025, 1, 1));
        let txn = TransactionService::create(&store, draft("s", TransactionKind::Income, 1.0, date(2025, 1, 1)), &clock).unwrap();
        let updated = TransactionService::update(&store, &txn.id, |t| {
            t.id = "other".into();
            t.amount = -7.0;
        })
        .unwrap();
        assert_eq!(updated.id, txn.id);
        assert_eq!(updated.amount, 7.0);
        assert!(TransactionService::update(&store, "missing", |_| {}).is_err());
    }

    #[test]
    fn delete_by_recurrence_counts_removed() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(date(2025, 1, 1));
        for _ in 0..2 {
            let mut linked = draft("s", TransactionKind::Expense, 1.0, date(2025, 1, 1));
            linked.recurrence_id = Some("r1".into());
            TransactionService::create(&store, linked, &clock).unwrap();
        }
        TransactionService::create(&store, draft("s", TransactionKind::Expense, 1.0, date(2025, 1, 1)), &clock).unwrap();
        assert_eq!(TransactionService::delete_by_recurrence(&store, "r1").unwrap(), 2);
        assert_eq!(TransactionService::list(&store).unwrap().len(), 1);
    }
}
