//! Exchange-rate lookups backed by the rate cache store.

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    core::time::Clock,
    errors::Result,
    storage::{IndexName, Store, StoreExt},
};

use super::{pair_key, CurrencyCode, RateEntry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchedRate {
    pub rate: f64,
    pub date: NaiveDate,
}

/// Source of fresh rates, typically a network client. Failing is expected
/// and never fatal to callers.
pub trait RateFetcher: Send + Sync {
    fn fetch_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<FetchedRate>;
}

/// Serves rates from the cache store while they are fresh and falls back to
/// the fetcher otherwise.
pub struct CachedRateProvider<'a, S: Store + ?Sized> {
    store: &'a S,
    fetcher: &'a dyn RateFetcher,
    clock: &'a dyn Clock,
    cache_hours: u32,
}

impl<'a, S: Store + ?Sized> CachedRateProvider<'a, S> {
    pub fn new(
        store: &'a S,
        fetcher: &'a dyn RateFetcher,
        clock: &'a dyn Clock,
        cache_hours: u32,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            cache_hours,
        }
    }

    fn is_expired(&self, entry: &RateEntry) -> bool {
        self.clock.now() - entry.fetched_at > Duration::hours(self.cache_hours as i64)
    }

    /// A fresh rate for the pair, or `None` when neither the cache nor the
    /// fetcher can supply one.
    pub fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        if let Some(cached) = self.cached(from, to) {
            return Some(cached.rate);
        }
        match self.fetcher.fetch_rate(from, to) {
            Ok(fetched) => {
                self.remember(from, to, fetched);
                Some(fetched.rate)
            }
            Err(err) => {
                warn!(from = %from, to = %to, error = %err, "exchange rate fetch failed");
                None
            }
        }
    }

    /// Today's entry when fresh, else the newest fresh entry for the pair.
    /// Fetchers may report a rate dated before today, so not every fresh
    /// entry carries today's id.
    fn cached(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<RateEntry> {
        let id = RateEntry::cache_id(from, to, self.clock.today());
        let entry = match self.store.get::<RateEntry>(&id) {
            Ok(Some(entry)) => entry,
            Ok(None) => return self.latest_fresh(from, to),
            Err(err) => {
                warn!(id = %id, error = %err, "reading cached rate failed");
                return None;
            }
        };
        if self.is_expired(&entry) {
            debug!(id = %id, "cached rate expired");
            if let Err(err) = self.store.delete::<RateEntry>(&id) {
                warn!(id = %id, error = %err, "deleting expired rate failed");
            }
            return None;
        }
        Some(entry)
    }

    fn latest_fresh(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<RateEntry> {
        match self.latest_rate(from, to) {
            Ok(entry) => entry.filter(|entry| !self.is_expired(entry)),
            Err(err) => {
                warn!(from = %from, to = %to, error = %err, "reading cached rates failed");
                None
            }
        }
    }

    fn remember(&self, from: &CurrencyCode, to: &CurrencyCode, fetched: FetchedRate) {
        let entry = RateEntry::new(
            from.clone(),
            to.clone(),
            fetched.rate,
            fetched.date,
            self.clock.now(),
        );
        if let Err(err) = self.store.put(&entry) {
            warn!(id = %entry.id, error = %err, "caching rate failed");
        }
    }

    /// Deletes every cached entry older than the cache window.
    pub fn clear_expired(&self) -> Result<usize> {
        let entries: Vec<RateEntry> = self.store.get_all()?;
        let mut removed = 0;
        for entry in entries.iter().filter(|entry| self.is_expired(entry)) {
            self.store.delete::<RateEntry>(&entry.id)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Newest cached entry for the pair regardless of age.
    pub fn latest_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Option<RateEntry>> {
        let entries: Vec<RateEntry> = self
            .store
            .get_all_by_index(IndexName::RatesByCurrencyPair, &pair_key(from, to))?;
        Ok(entries.into_iter().max_by_key(|entry| entry.date))
    }
}
