use chrono::{Datelike, Days, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl TimeInterval {
    pub const fn new(every: u32, unit: TimeUnit) -> Self {
        Self { every, unit }
    }

    /// Advances `from` by one interval. Month and year steps keep the day of
    /// month and fall back to the last day when the target month is shorter.
    /// `None` once the step leaves the representable date range.
    pub fn next_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        let every = i32::try_from(self.every).ok();
        match self.unit {
            TimeUnit::Day => from.checked_add_days(Days::new(self.every.into())),
            TimeUnit::Week => from.checked_add_days(Days::new(u64::from(self.every) * 7)),
            TimeUnit::Month => shift_month(from, every?),
            TimeUnit::Year => shift_year(from, every?),
        }
    }

    pub fn label(&self) -> String {
        match (self.every, &self.unit) {
            (1, TimeUnit::Day) => "Daily".into(),
            (1, TimeUnit::Week) => "Weekly".into(),
            (1, TimeUnit::Month) => "Monthly".into(),
            (1, TimeUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {:?}{}", n, unit, if n > 1 { "s" } else { "" }),
        }
    }
}

pub fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = (date.year() * 12 + date.month0() as i32).checked_add(months)?;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn shift_year(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    let month = date.month();
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Builds `day` in the given month, using the month's last day when `day`
/// does not exist there (day 31 in April lands on April 30).
pub fn clamped_day_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Builds `day` in the given month, letting surplus days roll into the next
/// month (day 31 in April lands on May 1).
pub fn overflowing_day_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(Duration::days(day as i64 - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_step_clamps_to_last_day() {
        let monthly = TimeInterval::new(1, TimeUnit::Month);
        assert_eq!(monthly.next_date(date(2025, 1, 31)), Some(date(2025, 2, 28)));
        assert_eq!(monthly.next_date(date(2024, 1, 31)), Some(date(2024, 2, 29)));
        assert_eq!(monthly.next_date(date(2025, 12, 15)), Some(date(2026, 1, 15)));
    }

    #[test]
    fn year_step_moves_leap_day_to_february_28() {
        let yearly = TimeInterval::new(1, TimeUnit::Year);
        assert_eq!(yearly.next_date(date(2024, 2, 29)), Some(date(2025, 2, 28)));
    }

    #[test]
    fn negative_month_shift_crosses_year_boundary() {
        assert_eq!(shift_month(date(2025, 1, 31), -2), Some(date(2024, 11, 30)));
    }

    #[test]
    fn steps_past_the_calendar_range_yield_none() {
        let start = date(2025, 1, 1);
        assert_eq!(TimeInterval::new(u32::MAX, TimeUnit::Day).next_date(start), None);
        assert_eq!(TimeInterval::new(u32::MAX, TimeUnit::Week).next_date(start), None);
        assert_eq!(TimeInterval::new(u32::MAX, TimeUnit::Month).next_date(start), None);
        assert_eq!(shift_year(start, i32::MAX), None);
        assert_eq!(shift_month(NaiveDate::MAX, 1), None);
    }

    #[test]
    fn clamped_and_overflowing_days_differ_in_short_months() {
        assert_eq!(clamped_day_in_month(2025, 2, 31), Some(date(2025, 2, 28)));
        assert_eq!(overflowing_day_in_month(2025, 2, 31), Some(date(2025, 3, 3)));
        assert_eq!(overflowing_day_in_month(2024, 2, 31), Some(date(2024, 3, 2)));
        assert_eq!(overflowing_day_in_month(2025, 3, 31), Some(date(2025, 3, 31)));
    }

    #[test]
    fn labels_match_common_intervals() {
        assert_eq!(TimeInterval::new(1, TimeUnit::Month).label(), "Monthly");
        assert_eq!(TimeInterval::new(10, TimeUnit::Day).label(), "Every 10 Days");
    }
}
