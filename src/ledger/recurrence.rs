use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, VaultError};

use super::{
    time_interval::{TimeInterval, TimeUnit},
    transaction::TransactionKind,
};

/// Longest accepted custom interval, roughly ten years.
pub const MAX_CUSTOM_INTERVAL_DAYS: u32 = 3_660;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

/// A single-stream rule that repeats a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recurrence {
    pub id: String,
    pub stream_id: String,
    pub amount: f64,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval_days: Option<u32>,
    /// Alignment day for monthly rules; ignored for every other frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Recurrence {
    pub fn new(
        stream_id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stream_id: stream_id.into(),
            amount,
            frequency,
            custom_interval_days: None,
            day_of_month: None,
            start_date,
            end_date: None,
            kind,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    pub fn with_custom_interval(mut self, days: u32) -> Self {
        self.custom_interval_days = Some(days);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Step between two occurrences. A custom rule without a usable
    /// interval advances one day at a time.
    pub fn interval(&self) -> TimeInterval {
        match self.frequency {
            Frequency::Daily => TimeInterval::new(1, TimeUnit::Day),
            Frequency::Weekly => TimeInterval::new(1, TimeUnit::Week),
            Frequency::Monthly => TimeInterval::new(1, TimeUnit::Month),
            Frequency::Yearly => TimeInterval::new(1, TimeUnit::Year),
            Frequency::Custom => {
                let days = self.custom_interval_days.filter(|days| *days > 0).unwrap_or(1);
                TimeInterval::new(days, TimeUnit::Day)
            }
        }
    }

    /// The explicit alignment day, when the rule has one.
    pub fn aligned_day(&self) -> Option<u32> {
        match (self.frequency, self.day_of_month) {
            (Frequency::Monthly, Some(day)) if day > 0 => Some(day),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream_id.trim().is_empty() {
            return Err(VaultError::validation("recurrence requires a stream"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(VaultError::validation(format!(
                "recurrence amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        match (self.frequency, self.custom_interval_days) {
            (Frequency::Custom, Some(days)) if days > MAX_CUSTOM_INTERVAL_DAYS => {
                return Err(VaultError::validation(format!(
                    "custom interval must be at most {} days, got {}",
                    MAX_CUSTOM_INTERVAL_DAYS, days
                )))
            }
            (Frequency::Custom, Some(days)) if days > 0 => {}
            (Frequency::Custom, _) => {
                return Err(VaultError::validation(
                    "custom recurrences require an interval of at least one day",
                ))
            }
            (_, Some(_)) => {
                return Err(VaultError::validation(
                    "custom interval is only allowed for custom recurrences",
                ))
            }
            _ => {}
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(VaultError::validation(format!(
                    "day of month must be between 1 and 31, got {}",
                    day
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(VaultError::validation(format!(
                    "end date {} precedes start date {}",
                    end, self.start_date
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn custom_interval_requires_positive_days() {
        let rule = Recurrence::new("s1", TransactionKind::Expense, 20.0, Frequency::Custom, start());
        assert!(matches!(rule.validate(), Err(VaultError::Validation(_))));
        assert_eq!(rule.interval(), TimeInterval::new(1, TimeUnit::Day));

        let rule = rule.with_custom_interval(10);
        assert!(rule.validate().is_ok());
        assert_eq!(rule.interval(), TimeInterval::new(10, TimeUnit::Day));
    }

    #[test]
    fn custom_interval_has_an_upper_bound() {
        let rule = Recurrence::new("s1", TransactionKind::Expense, 20.0, Frequency::Custom, start());
        assert!(rule.clone().with_custom_interval(MAX_CUSTOM_INTERVAL_DAYS).validate().is_ok());
        assert!(matches!(
            rule.clone().with_custom_interval(MAX_CUSTOM_INTERVAL_DAYS + 1).validate(),
            Err(VaultError::Validation(_))
        ));
        assert!(rule.with_custom_interval(u32::MAX).validate().is_err());
    }

    #[test]
    fn interval_days_rejected_for_other_frequencies() {
        let rule = Recurrence::new("s1", TransactionKind::Expense, 20.0, Frequency::Weekly, start())
            .with_custom_interval(3);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn day_of_month_only_aligns_monthly_rules() {
        let monthly = Recurrence::new("s1", TransactionKind::Income, 1.0, Frequency::Monthly, start())
            .with_day_of_month(31);
        assert_eq!(monthly.aligned_day(), Some(31));

        let yearly = Recurrence::new("s1", TransactionKind::Income, 1.0, Frequency::Yearly, start())
            .with_day_of_month(31);
        assert_eq!(yearly.aligned_day(), None);
    }

    #[test]
    fn rejects_end_before_start_and_bad_day() {
        let before = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let rule = Recurrence::new("s1", TransactionKind::Income, 1.0, Frequency::Daily, start())
            .with_end_date(before);
        assert!(rule.validate().is_err());

        let rule = Recurrence::new("s1", TransactionKind::Income, 1.0, Frequency::Monthly, start())
            .with_day_of_month(32);
        assert!(rule.validate().is_err());
    }
}
