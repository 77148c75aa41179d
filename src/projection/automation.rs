use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::{
    currency::CurrencyCode,
    ledger::{
        time_interval::{overflowing_day_in_month, shift_month},
        Automation, ProjectedTransaction, Stream,
    },
};

use super::{ProjectionConfig, MAX_PROJECTED_OCCURRENCES};

/// Day used for the first occurrence in the creation month.
const ANCHOR_DAY_CAP: u32 = 28;
/// Day cap for every later occurrence; surplus days roll into the next month.
const STEP_DAY_CAP: u32 = 31;

/// Expands active monthly automations into projected legs inside
/// `[from, to]`, sorted by date. Weekly and manual schedules, inactive
/// automations, installments and saving circles yield nothing.
pub fn expand(
    automations: &[Automation],
    streams: &[Stream],
    from: NaiveDate,
    to: NaiveDate,
    config: &ProjectionConfig,
) -> Vec<ProjectedTransaction> {
    let currencies: HashMap<&str, &CurrencyCode> = streams
        .iter()
        .map(|stream| (stream.id.as_str(), stream.base_currency()))
        .collect();

    let mut instances: Vec<ProjectedTransaction> = automations
        .iter()
        .flat_map(|automation| expand_one(automation, &currencies, from, to, config))
        .collect();
    instances.sort_by_key(|instance| instance.applicability_date);
    instances
}

fn expand_one(
    automation: &Automation,
    currencies: &HashMap<&str, &CurrencyCode>,
    from: NaiveDate,
    to: NaiveDate,
    config: &ProjectionConfig,
) -> Vec<ProjectedTransaction> {
    let mut instances = Vec::new();
    if !automation.is_active {
        return instances;
    }
    let day = match automation.schedule.monthly_day() {
        Some(day) if day > 0 => day,
        _ => return instances,
    };
    let legs = automation.legs();
    if legs.is_empty() {
        return instances;
    }

    let currency = resolve_currency(automation, currencies, &config.fallback_currency);
    let limit = config.effective_end(to);
    let mut next = Some(anchor_date(automation, day));
    while let Some(current) = next.filter(|date| *date < from) {
        next = step(current, day);
    }

    let mut occurrences = 0usize;
    while let Some(current) = next.filter(|date| *date <= limit) {
        if occurrences >= MAX_PROJECTED_OCCURRENCES {
            break;
        }
        for leg in &legs {
            instances.push(ProjectedTransaction {
                stream_id: leg.stream_id.to_string(),
                amount: automation.amount,
                currency: Some(currency.clone()),
                applicability_date: current,
                kind: leg.kind,
                tags: Vec::new(),
                recurrence_id: Some(automation.id.clone()),
                description: Some(automation.name.clone()),
                projection_date: config.generated_at,
            });
        }
        occurrences += 1;
        next = step(current, day);
    }

    instances
}

/// Occurrence in the creation month, with the day capped at the 28th.
pub fn anchor_date(automation: &Automation, day: u32) -> NaiveDate {
    let created = automation.created_at.date_naive();
    overflowing_day_in_month(created.year(), created.month(), day.min(ANCHOR_DAY_CAP))
        .unwrap_or(created)
}

/// Moves to the month after `current` and rebuilds the day there, letting
/// days past the month's end overflow (Feb 31 lands in early March).
pub fn step(current: NaiveDate, day: u32) -> Option<NaiveDate> {
    let next_month = shift_month(current, 1)?;
    match overflowing_day_in_month(next_month.year(), next_month.month(), day.min(STEP_DAY_CAP)) {
        Some(next) if next > current => Some(next),
        _ => Some(next_month),
    }
}

/// Automation override, else the target stream, else the source stream,
/// else the fallback.
pub fn resolve_currency(
    automation: &Automation,
    currencies: &HashMap<&str, &CurrencyCode>,
    fallback: &CurrencyCode,
) -> CurrencyCode {
    if let Some(currency) = automation.currency.as_ref().filter(|c| !c.is_empty()) {
        return currency.clone();
    }
    let lookup = |id: Option<&str>| id.and_then(|id| currencies.get(id)).map(|c| (*c).clone());
    lookup(automation.kind.target_stream_id())
        .or_else(|| lookup(automation.kind.source_stream_id()))
        .unwrap_or_else(|| fallback.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::time::FixedClock,
        ledger::{AutomationKind, Schedule, TransactionKind},
    };
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn created(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn config(today: NaiveDate) -> ProjectionConfig {
        ProjectionConfig::new(&FixedClock::on(today))
    }

    fn salary(day: u32) -> Automation {
        Automation::new(
            "Salary",
            AutomationKind::Salary {
                target_stream_id: "S".into(),
            },
            5000.0,
            Schedule::monthly(day),
            created(2024, 12, 1),
        )
        .with_id("auto-1")
        .with_currency(CurrencyCode::new("USD"))
    }

    #[test]
    fn salary_projects_one_income_per_month() {
        let out = expand(
            &[salary(15)],
            &[],
            date(2025, 1, 1),
            date(2025, 3, 31),
            &config(date(2025, 1, 1)),
        );
        let dates: Vec<NaiveDate> = out.iter().map(|i| i.applicability_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15)]);
        for instance in &out {
            assert_eq!(instance.stream_id, "S");
            assert_eq!(instance.amount, 5000.0);
            assert_eq!(instance.kind, TransactionKind::Income);
            assert_eq!(instance.recurrence_id.as_deref(), Some("auto-1"));
            assert_eq!(instance.description.as_deref(), Some("Salary"));
        }
    }

    #[test]
    fn anchor_caps_at_28_and_later_steps_overflow() {
        let mut automation = salary(31);
        automation.created_at = created(2025, 1, 3);
        assert_eq!(anchor_date(&automation, 31), date(2025, 1, 28));
        assert_eq!(step(date(2025, 1, 28), 31), Some(date(2025, 3, 3)));
        assert_eq!(step(date(2024, 1, 28), 31), Some(date(2024, 3, 2)));
        assert_eq!(step(date(2025, 3, 3), 31), Some(date(2025, 5, 1)));
        assert_eq!(step(NaiveDate::MAX, 31), None);
    }

    #[test]
    fn inactive_and_non_monthly_are_skipped() {
        let mut inactive = salary(5);
        inactive.is_active = false;
        let mut manual = salary(5);
        manual.schedule = Schedule::manual();
        let out = expand(
            &[inactive, manual],
            &[],
            date(2025, 1, 1),
            date(2025, 12, 31),
            &config(date(2025, 1, 1)),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn currency_prefers_target_then_source_then_fallback() {
        let bank = Stream::new("Bank", "bank", CurrencyCode::new("EGP")).with_id("bank");
        let card = Stream::new("Card", "card", CurrencyCode::new("EUR")).with_id("card");
        let automation = Automation::new(
            "Pay card",
            AutomationKind::CcPayment {
                source_stream_id: "bank".into(),
                target_stream_id: "card".into(),
            },
            100.0,
            Schedule::monthly(10),
            created(2025, 1, 1),
        );
        let streams = [bank, card];
        let currencies: HashMap<&str, &CurrencyCode> = streams
            .iter()
            .map(|s| (s.id.as_str(), s.base_currency()))
            .collect();
        let fallback = CurrencyCode::new("USD");
        assert_eq!(resolve_currency(&automation, &currencies, &fallback).as_str(), "EUR");

        let mut orphan = automation.clone();
        orphan.kind = AutomationKind::CcPayment {
            source_stream_id: "bank".into(),
            target_stream_id: "gone".into(),
        };
        assert_eq!(resolve_currency(&orphan, &currencies, &fallback).as_str(), "EGP");

        let empty = HashMap::new();
        assert_eq!(resolve_currency(&orphan, &empty, &fallback).as_str(), "USD");
    }
}
