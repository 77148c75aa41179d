use crate::balance::BalanceCalculator;
use crate::cli::context::{CliContext, CommandResult, Flags};
use crate::cli::output::{self, render_table};
use crate::cli::registry::CommandEntry;
use crate::currency::format_currency_value;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "balance",
            "Money in hand, projected money and net position",
            "balance [--date YYYY-MM-DD] [--currency CODE]",
            cmd_balance,
        ),
        CommandEntry::new(
            "streams",
            "List active streams with their balances today",
            "streams",
            cmd_streams,
        ),
        CommandEntry::new(
            "credit",
            "Card usage and available credit",
            "credit [--date YYYY-MM-DD]",
            cmd_credit,
        ),
    ]
}

fn cmd_balance(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, &["date", "currency"])?;
    let as_of = flags.date("date")?.unwrap_or_else(|| context.today());
    let currency = flags
        .currency("currency")
        .unwrap_or_else(|| context.config.primary_currency.clone());

    let snapshot = context.snapshot()?;
    let timeline = snapshot.timeline(&context.projection_config());
    let calculator = BalanceCalculator::with_target(&snapshot.rates, &currency);
    let report = calculator.report(&snapshot.streams, &timeline, as_of);

    output::section(format!("Balance as of {} ({})", report.as_of, currency));
    output::info(format!(
        "  Money in hand : {}",
        format_currency_value(report.money_in_hand, &currency)
    ));
    output::info(format!(
        "  Projected     : {}",
        format_currency_value(report.projected_money, &currency)
    ));
    output::info(format!(
        "  Card usage    : {}",
        format_currency_value(report.credit.total_usage, &currency)
    ));
    output::info(format!(
        "  Net position  : {}",
        format_currency_value(report.net_position, &currency)
    ));
    if let Some(warning) = report.audit.warning() {
        output::warning(warning);
    }
    Ok(())
}

fn cmd_streams(context: &mut CliContext, args: &[&str]) -> CommandResult {
    Flags::parse(args, &[])?;
    let today = context.today();
    let snapshot = context.snapshot()?;
    let balances = BalanceCalculator::stream_balances(&snapshot.transactions, today);

    let active: Vec<_> = snapshot
        .streams
        .iter()
        .filter(|stream| !stream.is_archived())
        .collect();
    if active.is_empty() {
        output::info("No streams yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = active
        .iter()
        .map(|stream| {
            let balance = balances.get(&stream.id).copied().unwrap_or(0.0);
            vec![
                stream.name.clone(),
                stream.base_currency().to_string(),
                if stream.is_credit_card { "card" } else { "" }.to_string(),
                format_currency_value(balance, stream.base_currency()),
            ]
        })
        .collect();
    output::section("Streams");
    output::info(render_table(&["Name", "Currency", "Kind", "Balance"], &rows));
    Ok(())
}

fn cmd_credit(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, &["date"])?;
    let as_of = flags.date("date")?.unwrap_or_else(|| context.today());
    let currency = context.config.primary_currency.clone();

    let snapshot = context.snapshot()?;
    let timeline = snapshot.timeline(&context.projection_config());
    let calculator = BalanceCalculator::with_target(&snapshot.rates, &currency);
    let summary = calculator.credit_summary(&snapshot.streams, &timeline, as_of);

    if summary.cards.is_empty() {
        output::info("No credit cards.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = summary
        .cards
        .iter()
        .map(|card| {
            vec![
                card.name.clone(),
                format_currency_value(card.credit_limit, &currency),
                format_currency_value(card.usage, &currency),
                format_currency_value(card.available, &currency),
            ]
        })
        .collect();
    output::section(format!("Credit as of {as_of}"));
    output::info(render_table(&["Card", "Limit", "Used", "Available"], &rows));
    output::info(format!(
        "Total available: {} of {}",
        format_currency_value(summary.total_available, &currency),
        format_currency_value(summary.total_limit, &currency)
    ));
    Ok(())
}
