use std::collections::HashMap;

use chrono::NaiveDate;

use crate::ledger::{
    Automation, Movement, ProjectedTransaction, Recurrence, Stream, TimelineEntry, Transaction,
};

use super::{automation, recurrence, ProjectionConfig};

/// Concatenates both expansions and stable-sorts them by date.
pub fn combine(
    recurrence_expansions: Vec<ProjectedTransaction>,
    automation_expansions: Vec<ProjectedTransaction>,
) -> Vec<ProjectedTransaction> {
    let mut combined = recurrence_expansions;
    combined.extend(automation_expansions);
    combined.sort_by_key(|instance| instance.applicability_date);
    combined
}

/// Real transactions followed by projections, stable-sorted by date. No
/// de-duplication happens between the two.
pub fn merge_with_real(
    real: &[Transaction],
    projected: Vec<ProjectedTransaction>,
) -> Vec<TimelineEntry> {
    let mut timeline: Vec<TimelineEntry> = real
        .iter()
        .cloned()
        .map(TimelineEntry::Real)
        .chain(projected.into_iter().map(TimelineEntry::Projected))
        .collect();
    timeline.sort_by_key(|entry| entry.applicability_date());
    timeline
}

/// Fills instances still lacking a currency with their stream's base
/// currency. Unknown streams leave the currency empty.
pub fn resolve_currencies(
    projected: Vec<ProjectedTransaction>,
    streams: &[Stream],
) -> Vec<ProjectedTransaction> {
    let by_id: HashMap<&str, &Stream> = streams
        .iter()
        .map(|stream| (stream.id.as_str(), stream))
        .collect();
    projected
        .into_iter()
        .map(|instance| {
            let currency = by_id
                .get(instance.stream_id.as_str())
                .map(|stream| stream.base_currency());
            instance.resolve_currency(currency)
        })
        .collect()
}

/// Every projection for the window: recurrences (currency-resolved against
/// `streams`) combined with automations.
pub fn project_all(
    recurrences: &[Recurrence],
    automations: &[Automation],
    streams: &[Stream],
    from: NaiveDate,
    to: NaiveDate,
    config: &ProjectionConfig,
) -> Vec<ProjectedTransaction> {
    let from_rules = resolve_currencies(recurrence::expand_all(recurrences, from, to, config), streams);
    let from_automations = automation::expand(automations, streams, from, to, config);
    combine(from_rules, from_automations)
}
