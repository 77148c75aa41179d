mod common;

use chrono::{TimeZone, Utc};
use common::{clock_on, date, FailingStore};
use finance_vault::{
    config::Config,
    core::{
        services::{AutomationService, StreamService, TransactionService},
        AutomationRunner, CatchUpPolicy, SkipReason,
    },
    currency::CurrencyCode,
    ledger::{Automation, AutomationKind, Schedule, Stream, TransactionKind},
    storage::MemoryStore,
};

fn created_jan_first() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()
}

fn salary(target: &str, day: u32) -> Automation {
    Automation::new(
        "Salary",
        AutomationKind::Salary {
            target_stream_id: target.into(),
        },
        3000.0,
        Schedule::monthly(day),
        created_jan_first(),
    )
}

#[test]
fn transfer_legs_use_their_own_stream_currency() {
    let store = MemoryStore::new();
    StreamService::create(&store, Stream::new("Bank", "bank", CurrencyCode::new("EGP")).with_id("bank")).unwrap();
    StreamService::create(&store, Stream::new("Wallet", "wallet", CurrencyCode::new("USD")).with_id("wallet")).unwrap();
    AutomationService::create(
        &store,
        Automation::new(
            "Top up",
            AutomationKind::Transfer {
                source_stream_id: "bank".into(),
                target_stream_id: "wallet".into(),
            },
            100.0,
            Schedule::monthly(3),
            created_jan_first(),
        ),
    )
    .unwrap();

    let clock = clock_on(2025, 2, 3);
    let report = AutomationRunner::new(&store, &clock).run().unwrap();
    assert_eq!(report.transactions_created(), 2);

    let bank = TransactionService::find_by_stream(&store, "bank").unwrap();
    let wallet = TransactionService::find_by_stream(&store, "wallet").unwrap();
    assert_eq!(bank[0].kind, TransactionKind::Expense);
    assert_eq!(bank[0].currency.as_str(), "EGP");
    assert_eq!(wallet[0].kind, TransactionKind::Income);
    assert_eq!(wallet[0].currency.as_str(), "USD");
    assert_eq!(bank[0].applicability_date, date(2025, 2, 3));
}

#[test]
fn one_failing_automation_does_not_stop_the_rest() {
    let store = FailingStore::new("broken");
    let failing = AutomationService::create(&store, salary("broken", 10)).unwrap();
    let healthy = AutomationService::create(&store, salary("bank", 10)).unwrap();

    let clock = clock_on(2025, 3, 10);
    let report = AutomationRunner::new(&store, &clock).run().unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, failing.id);
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].automation_id, healthy.id);

    // The failed automation was not marked as run and will retry.
    let stored = AutomationService::find(&store, &failing.id).unwrap().unwrap();
    assert!(stored.last_run_at.is_none());
}

#[test]
fn second_run_on_the_same_day_is_a_no_op() {
    let store = MemoryStore::new();
    AutomationService::create(&store, salary("bank", 10)).unwrap();
    let clock = clock_on(2025, 3, 10);
    let runner = AutomationRunner::new(&store, &clock);
    runner.run().unwrap();
    let again = runner.run().unwrap();
    assert!(again.fired.is_empty());
    assert_eq!(again.skipped[0].1, SkipReason::AlreadyRanToday);
    assert_eq!(TransactionService::list(&store).unwrap().len(), 1);
}

#[test]
fn inactive_and_manual_automations_are_skipped() {
    let store = MemoryStore::new();
    let paused = AutomationService::create(&store, salary("bank", 10)).unwrap();
    AutomationService::toggle(&store, &paused.id).unwrap();
    let mut manual = salary("bank", 10);
    manual.schedule = Schedule::manual();
    let manual = AutomationService::create(&store, manual).unwrap();

    let clock = clock_on(2025, 3, 10);
    let report = AutomationRunner::new(&store, &clock).run().unwrap();
    assert!(report.fired.is_empty());
    assert!(report.skipped.contains(&(paused.id, SkipReason::Inactive)));
    assert!(report.skipped.contains(&(manual.id, SkipReason::NotMonthly)));
}

#[test]
fn backfill_policy_comes_from_config() {
    let store = MemoryStore::new();
    AutomationService::create(&store, salary("bank", 20)).unwrap();
    let config = Config {
        catch_up: CatchUpPolicy::Backfill { max_days: 45 },
        fallback_currency: CurrencyCode::new("EGP"),
        ..Config::default()
    };

    let clock = clock_on(2025, 4, 5);
    let report = AutomationRunner::from_config(&store, &clock, &config).run().unwrap();
    // 45 days back from April 5th reaches February 19th.
    assert_eq!(report.fired[0].dates, vec![date(2025, 2, 20), date(2025, 3, 20)]);

    let transactions = TransactionService::list(&store).unwrap();
    assert_eq!(transactions.len(), 2);
    assert!(transactions.iter().all(|t| t.currency.as_str() == "EGP"));

    // The run moved last_run_at forward, so nothing is left to catch up.
    let again = AutomationRunner::from_config(&store, &clock, &config).run().unwrap();
    assert!(again.fired.is_empty());
}
