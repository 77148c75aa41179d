use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::Result;
use crate::ledger::Automation;
use crate::storage::{Store, StoreExt};

pub struct AutomationService;

impl AutomationService {
    pub fn create<S: Store + ?Sized>(store: &S, automation: Automation) -> Result<Automation> {
        automation.validate()?;
        store.put(&automation)?;
        info!(
            automation = %automation.id,
            kind = automation.kind.label(),
            "automation created"
        );
        Ok(automation)
    }

    pub fn update<S, F>(store: &S, id: &str, mutator: F) -> Result<Automation>
    where
        S: Store + ?Sized,
        F: FnOnce(&mut Automation),
    {
        let existing: Automation = store.fetch(id)?;
        let mut updated = existing.clone();
        mutator(&mut updated);
        updated.id = existing.id;
        updated.created_at = existing.created_at;
        updated.validate()?;
        store.put(&updated)?;
        Ok(updated)
    }

    pub fn find<S: Store + ?Sized>(store: &S, id: &str) -> Result<Option<Automation>> {
        store.get(id)
    }

    /// All automations, oldest first.
    pub fn list<S: Store + ?Sized>(store: &S) -> Result<Vec<Automation>> {
        let mut automations: Vec<Automation> = store.get_all()?;
        automations.sort_by_key(|automation| automation.created_at);
        Ok(automations)
    }

    pub fn list_active<S: Store + ?Sized>(store: &S) -> Result<Vec<Automation>> {
        Ok(Self::list(store)?
            .into_iter()
            .filter(|automation| automation.is_active)
            .collect())
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle<S: Store + ?Sized>(store: &S, id: &str) -> Result<bool> {
        let mut automation: Automation = store.fetch(id)?;
        automation.is_active = !automation.is_active;
        store.put(&automation)?;
        Ok(automation.is_active)
    }

    pub fn set_last_run<S: Store + ?Sized>(store: &S, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut automation: Automation = store.fetch(id)?;
        automation.last_run_at = Some(at);
        store.put(&automation)
    }

    pub fn delete<S: Store + ?Sized>(store: &S, id: &str) -> Result<()> {
        store.delete::<Automation>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VaultError;
    use crate::ledger::{AutomationKind, Schedule};
    use crate::storage::MemoryStore;

    fn salary(target: &str) -> Automation {
        Automation::new(
            "Salary",
            AutomationKind::Salary {
                target_stream_id: target.into(),
            },
            1000.0,
            Schedule::monthly(25),
            Utc::now(),
        )
    }

    #[test]
    fn validation_guards_create_and_update() {
        let store = MemoryStore::new();
        assert!(matches!(
            AutomationService::create(&store, salary("")),
            Err(VaultError::Validation(_))
        ));
        let created = AutomationService::create(&store, salary("bank")).unwrap();
        assert!(AutomationService::update(&store, &created.id, |a| a.amount = -1.0).is_err());
        let stored = AutomationService::find(&store, &created.id).unwrap().unwrap();
        assert_eq!(stored.amount, 1000.0);
    }

    #[test]
    fn toggle_flips_active_listing() {
        let store = MemoryStore::new();
        let created = AutomationService::create(&store, salary("bank")).unwrap();
        assert!(!AutomationService::toggle(&store, &created.id).unwrap());
        assert!(AutomationService::list_active(&store).unwrap().is_empty());
        assert!(AutomationService::toggle(&store, &created.id).unwrap());
        assert_eq!(AutomationService::list_active(&store).unwrap().len(), 1);
    }

    #[test]
    fn set_last_run_records_timestamp() {
        let store = MemoryStore::new();
        let created = AutomationService::create(&store, salary("bank")).unwrap();
        let at = Utc::now();
        AutomationService::set_last_run(&store, &created.id, at).unwrap();
        let stored = AutomationService::find(&store, &created.id).unwrap().unwrap();
        assert_eq!(stored.last_run_at, Some(at));
    }
}
