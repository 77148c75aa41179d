use tracing::info;

use crate::currency::{CachedRateProvider, CurrencyCode, RateEntry, RateTable, COMMON_CURRENCIES};
use crate::errors::{Result, VaultError};
use crate::storage::{Store, StoreExt};

pub struct RateService;

impl RateService {
    /// Fresh rate table from every cached entry, newest per pair winning.
    pub fn rate_table<S: Store + ?Sized>(store: &S) -> Result<RateTable> {
        let entries: Vec<RateEntry> = store.get_all()?;
        Ok(RateTable::build(&entries))
    }

    /// Cached entries, newest first.
    pub fn list<S: Store + ?Sized>(store: &S) -> Result<Vec<RateEntry>> {
        let mut entries: Vec<RateEntry> = store.get_all()?;
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    pub fn save<S: Store + ?Sized>(store: &S, entry: RateEntry) -> Result<RateEntry> {
        if !entry.rate.is_finite() || entry.rate <= 0.0 {
            return Err(VaultError::validation(format!(
                "exchange rate must be positive, got {}",
                entry.rate
            )));
        }
        let entry = RateEntry::new(
            entry.from_currency,
            entry.to_currency,
            entry.rate,
            entry.date,
            entry.fetched_at,
        );
        store.put(&entry)?;
        Ok(entry)
    }

    /// Makes sure today's rate from every common currency into `primary` is
    /// cached. Returns how many pairs now have a rate.
    pub fn refresh_common<S: Store + ?Sized>(
        provider: &CachedRateProvider<'_, S>,
        primary: &CurrencyCode,
    ) -> usize {
        let mut available = 0;
        for info in COMMON_CURRENCIES.iter().filter(|info| info.code != primary.as_str()) {
            if provider.rate(&CurrencyCode::new(info.code), primary).is_some() {
                available += 1;
            }
        }
        info!(primary = %primary, available, "common exchange rates refreshed");
        available
    }
}
