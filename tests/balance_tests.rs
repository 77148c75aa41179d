mod common;

use chrono::Utc;
use common::{clock_on, date, projection_on};
use finance_vault::{
    balance::BalanceCalculator,
    core::services::{RateService, StreamService, TransactionService},
    currency::{convert, CurrencyCode, RateEntry, RateTable},
    ledger::{Frequency, NewTransaction, Recurrence, Stream, Transaction, TransactionKind},
    projection::{merge_with_real, project_all},
    storage::MemoryStore,
};

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD")
}

#[test]
fn card_liability_tracks_spending_and_payments() {
    let store = MemoryStore::new();
    let clock = clock_on(2025, 1, 1);
    let card = StreamService::create(
        &store,
        Stream::credit_card("Visa", usd(), 1000.0, 100.0).with_id("card"),
    )
    .unwrap();
    let baseline = card.clone();

    TransactionService::create(
        &store,
        NewTransaction::new("card", TransactionKind::Expense, 50.0, usd(), date(2025, 1, 5)),
        &clock,
    )
    .unwrap();
    let transactions = TransactionService::list(&store).unwrap();
    let table = RateTable::new();
    let target = usd();
    let calc = BalanceCalculator::with_target(&table, &target);
    assert_eq!(calc.credit_usage(&baseline, &transactions, date(2025, 1, 6)), 150.0);

    TransactionService::create(
        &store,
        NewTransaction::new("card", TransactionKind::Income, 30.0, usd(), date(2025, 1, 7)),
        &clock,
    )
    .unwrap();
    let transactions = TransactionService::list(&store).unwrap();
    let summary = calc.credit_summary(&[baseline], &transactions, date(2025, 1, 8));
    assert_eq!(summary.total_usage, 120.0);
    assert_eq!(summary.cards[0].available, 880.0);

    // The write path keeps its own clamped running figure.
    let stored = StreamService::find(&store, "card").unwrap().unwrap();
    assert_eq!(stored.current_usage, Some(120.0));
}

#[test]
fn missing_rates_count_one_to_one() {
    let empty = RateTable::new();
    for amount in [0.0, 12.5, -40.0] {
        assert_eq!(convert(amount, &CurrencyCode::new("EGP"), &usd(), &empty), amount);
    }
}

#[test]
fn inverse_rate_is_used_when_direct_is_missing() {
    let store = MemoryStore::new();
    RateService::save(
        &store,
        RateEntry::new(usd(), CurrencyCode::new("EGP"), 50.0, date(2025, 1, 1), Utc::now()),
    )
    .unwrap();
    let table = RateService::rate_table(&store).unwrap();
    assert_eq!(convert(100.0, &CurrencyCode::new("EGP"), &usd(), &table), 2.0);
    assert_eq!(convert(2.0, &usd(), &CurrencyCode::new("EGP"), &table), 100.0);
}

#[test]
fn merged_timeline_splits_real_and_projected_money() {
    let store = MemoryStore::new();
    let clock = clock_on(2025, 1, 15);
    let bank = StreamService::create(&store, Stream::new("Bank", "bank", usd()).with_id("bank")).unwrap();
    TransactionService::create(
        &store,
        NewTransaction::new("bank", TransactionKind::Income, 1000.0, usd(), date(2025, 1, 1)),
        &clock,
    )
    .unwrap();
    let rent = Recurrence::new("bank", TransactionKind::Expense, 300.0, Frequency::Monthly, date(2025, 1, 31))
        .with_day_of_month(31);

    let config = projection_on(2025, 1, 15);
    let projected = project_all(&[rent], &[], &[bank.clone()], date(2025, 1, 16), date(2025, 3, 31), &config);
    let timeline = merge_with_real(&TransactionService::list(&store).unwrap(), projected);
    assert_eq!(timeline.len(), 4);

    let table = RateTable::new();
    let target = usd();
    let calc = BalanceCalculator::with_target(&table, &target);
    let report = calc.report(&[bank], &timeline, date(2025, 2, 28));
    assert_eq!(report.money_in_hand, 400.0);
    assert_eq!(report.projected_money, -300.0);
    assert_eq!(report.net_position, 400.0);
    assert!(!report.audit.has_fallbacks());
}

#[test]
fn net_position_subtracts_card_debt_once() {
    let table = RateTable::new();
    let target = usd();
    let calc = BalanceCalculator::with_target(&table, &target);
    let bank = Stream::new("Bank", "bank", usd()).with_id("bank");
    let card = Stream::credit_card("Visa", usd(), 500.0, 0.0).with_id("card");
    let transactions = vec![
        Transaction::record(
            NewTransaction::new("bank", TransactionKind::Income, 1000.0, usd(), date(2025, 1, 1)),
            Utc::now(),
        ),
        Transaction::record(
            NewTransaction::new("card", TransactionKind::Expense, 200.0, usd(), date(2025, 1, 2)),
            Utc::now(),
        ),
    ];
    assert_eq!(calc.net_position(&[bank, card], &transactions, date(2025, 1, 3)), 800.0);
}
