//! Pure expansion of recurrence rules and automations into projected
//! transactions, plus the timeline helpers that merge them with real ones.

pub mod automation;
pub mod recurrence;
pub mod timeline;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{core::time::Clock, currency::CurrencyCode, ledger::time_interval::shift_year};

pub use timeline::{combine, merge_with_real, project_all, resolve_currencies};

pub const DEFAULT_HORIZON_YEARS: u32 = 2;
/// Longest horizon a config may ask for.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Upper bound on instances emitted for a single rule in one expansion.
pub(crate) const MAX_PROJECTED_OCCURRENCES: usize = 100_000;

/// Inputs every expander shares: the reference day, how far ahead any
/// projection may reach, and the currency used when nothing else resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub horizon_years: u32,
    pub today: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub fallback_currency: CurrencyCode,
}

impl ProjectionConfig {
    pub fn new(clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            today: now.date_naive(),
            generated_at: now,
            fallback_currency: CurrencyCode::default(),
        }
    }

    pub fn with_horizon_years(mut self, years: u32) -> Self {
        self.horizon_years = years;
        self
    }

    pub fn with_fallback_currency(mut self, currency: CurrencyCode) -> Self {
        self.fallback_currency = currency;
        self
    }

    /// Last day any projection may land on. A horizon reaching past the
    /// calendar saturates at the last representable date.
    pub fn horizon_end(&self) -> NaiveDate {
        i32::try_from(self.horizon_years)
            .ok()
            .and_then(|years| shift_year(self.today, years))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Clamps a requested window end to the horizon.
    pub fn effective_end(&self, to: NaiveDate) -> NaiveDate {
        to.min(self.horizon_end())
    }
}
