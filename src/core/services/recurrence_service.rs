use chrono::NaiveDate;

use crate::core::services::TransactionService;
use crate::errors::Result;
use crate::ledger::Recurrence;
use crate::projection::recurrence::upcoming_instances;
use crate::storage::{IndexName, Store, StoreExt};

pub struct RecurrenceService;

impl RecurrenceService {
    pub fn create<S: Store + ?Sized>(store: &S, recurrence: Recurrence) -> Result<Recurrence> {
        recurrence.validate()?;
        store.put(&recurrence)?;
        Ok(recurrence)
    }

    pub fn update<S, F>(store: &S, id: &str, mutator: F) -> Result<Recurrence>
    where
        S: Store + ?Sized,
        F: FnOnce(&mut Recurrence),
    {
        let mut recurrence: Recurrence = store.fetch(id)?;
        mutator(&mut recurrence);
        recurrence.id = id.to_string();
        recurrence.validate()?;
        store.put(&recurrence)?;
        Ok(recurrence)
    }

    pub fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<Recurrence>> {
        store.get(id)
    }

    pub fn list<S: Store + ?Sized>(store: &S) -> Result<Vec<Recurrence>> {
        let mut recurrences: Vec<Recurrence> = store.get_all()?;
        recurrences.sort_by_key(|recurrence| recurrence.start_date);
        Ok(recurrences)
    }

    pub fn list_by_stream<S: Store + ?Sized>(store: &S, stream_id: &str) -> Result<Vec<Recurrence>> {
        store.get_all_by_index(IndexName::RecurrencesByStream, stream_id)
    }

    /// Next `count` dates of a stored rule.
    pub fn upcoming<S: Store + ?Sized>(
        store: &S,
        id: &str,
        count: usize,
        today: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let recurrence: Recurrence = store.fetch(id)?;
        Ok(upcoming_instances(&recurrence, count, today))
    }

    /// Removes the rule, and with `cascade` every transaction that links back
    /// to it. Returns how many transactions were removed.
    pub fn delete<S: Store + ?Sized>(store: &S, id: &str, cascade: bool) -> Result<usize> {
        let removed = if cascade {
            TransactionService::delete_by_recurrence(store, id)?
        } else {
            0
        };
        store.delete::<Recurrence>(id)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VaultError;
    use crate::ledger::{Frequency, TransactionKind};
    use crate::storage::MemoryStore;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn invalid_rules_are_not_stored() {
        let store = MemoryStore::new();
        let rule = Recurrence::new("s1", TransactionKind::Expense, 5.0, Frequency::Custom, start());
        assert!(matches!(
            RecurrenceService::create(&store, rule),
            Err(VaultError::Validation(_))
        ));
        assert!(RecurrenceService::list(&store).unwrap().is_empty());
    }

    #[test]
    fn update_revalidates() {
        let store = MemoryStore::new();
        let rule = Recurrence::new("s1", TransactionKind::Expense, 5.0, Frequency::Monthly, start());
        let rule = RecurrenceService::create(&store, rule).unwrap();
        assert!(RecurrenceService::update(&store, &rule.id, |r| r.day_of_month = Some(40)).is_err());
        let updated = RecurrenceService::update(&store, &rule.id, |r| r.amount = 9.0).unwrap();
        assert_eq!(updated.amount, 9.0);
        assert_eq!(RecurrenceService::list_by_stream(&store, "s1").unwrap().len(), 1);
    }

    #[test]
    fn upcoming_reads_stored_rule() {
        let store = MemoryStore::new();
        let rule = Recurrence::new("s1", TransactionKind::Expense, 5.0, Frequency::Weekly, start());
        let rule = RecurrenceService::create(&store, rule).unwrap();
        let next = RecurrenceService::upcoming(&store, &rule.id, 2, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()).unwrap();
        assert_eq!(
            next,
            vec![
                NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
            ]
        );
    }
}
