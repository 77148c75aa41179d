use chrono::{Datelike, NaiveDate};

use crate::ledger::{
    time_interval::{clamped_day_in_month, shift_month},
    ProjectedTransaction, Recurrence,
};

use super::{ProjectionConfig, MAX_PROJECTED_OCCURRENCES};

/// Expands one rule into the instances falling inside `[from, to]`, never
/// past the configured horizon. Instances carry no currency; see
/// [`super::resolve_currencies`].
pub fn expand(
    recurrence: &Recurrence,
    from: NaiveDate,
    to: NaiveDate,
    config: &ProjectionConfig,
) -> Vec<ProjectedTransaction> {
    let limit = config.effective_end(to);
    let mut instances = Vec::new();
    let mut next = first_occurrence(recurrence, from);

    while let Some(current) = next.filter(|date| *date <= limit) {
        if instances.len() >= MAX_PROJECTED_OCCURRENCES
            || recurrence.end_date.is_some_and(|end| current > end)
        {
            break;
        }
        instances.push(ProjectedTransaction {
            stream_id: recurrence.stream_id.clone(),
            amount: recurrence.amount,
            currency: None,
            applicability_date: current,
            kind: recurrence.kind,
            tags: recurrence.tags.clone(),
            recurrence_id: Some(recurrence.id.clone()),
            description: recurrence.description.clone(),
            projection_date: config.generated_at,
        });
        next = next_occurrence(recurrence, current);
    }

    instances
}

/// Expands every rule and sorts the result by applicability date.
pub fn expand_all<'a, I>(
    recurrences: I,
    from: NaiveDate,
    to: NaiveDate,
    config: &ProjectionConfig,
) -> Vec<ProjectedTransaction>
where
    I: IntoIterator<Item = &'a Recurrence>,
{
    let mut all: Vec<ProjectedTransaction> = recurrences
        .into_iter()
        .flat_map(|recurrence| expand(recurrence, from, to, config))
        .collect();
    all.sort_by_key(|instance| instance.applicability_date);
    all
}

/// Date following `current` for this rule, or `None` past the last
/// representable date.
pub fn next_occurrence(recurrence: &Recurrence, current: NaiveDate) -> Option<NaiveDate> {
    match recurrence.aligned_day() {
        Some(day) => aligned_in_following_month(current, day),
        None => recurrence.interval().next_date(current),
    }
}

/// First occurrence on or after `from`.
pub fn first_occurrence(recurrence: &Recurrence, from: NaiveDate) -> Option<NaiveDate> {
    let start = recurrence.start_date;
    if let Some(day) = recurrence.aligned_day() {
        let mut candidate =
            clamped_day_in_month(start.year(), start.month(), day).unwrap_or(start);
        if candidate < start {
            candidate = aligned_in_following_month(start, day)?;
        }
        while candidate < from {
            candidate = aligned_in_following_month(candidate, day)?;
        }
        return Some(candidate);
    }

    let mut current = start;
    while current < from {
        current = next_occurrence(recurrence, current)?;
    }
    Some(current)
}

/// Next `count` dates of the rule starting today, or at the start date when
/// the rule has not begun yet. Stops at the rule's end date.
pub fn upcoming_instances(recurrence: &Recurrence, count: usize, today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count.min(64));
    let mut next = first_occurrence(recurrence, today.max(recurrence.start_date));
    while let Some(current) = next {
        if dates.len() >= count || recurrence.end_date.is_some_and(|end| current > end) {
            break;
        }
        dates.push(current);
        next = next_occurrence(recurrence, current);
    }
    dates
}

fn aligned_in_following_month(current: NaiveDate, day: u32) -> Option<NaiveDate> {
    let next = shift_month(current, 1)?;
    clamped_day_in_month(next.year(), next.month(), day).or(Some(next))
}
