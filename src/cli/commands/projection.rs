use crate::cli::context::{CliContext, CommandError, CommandResult, Flags};
use crate::cli::output::{self, render_table};
use crate::cli::registry::CommandEntry;
use crate::currency::format_currency_value;
use crate::ledger::TransactionKind;
use crate::projection::project_all;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "project",
        "List projected transactions in a date window",
        "project --from YYYY-MM-DD --to YYYY-MM-DD [--stream ID]",
        cmd_project,
    )]
}

fn cmd_project(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, &["from", "to", "stream"])?;
    let from = flags.required_date("from")?;
    let to = flags.required_date("to")?;
    if to < from {
        return Err(CommandError::InvalidArguments(
            "`--to` must not be before `--from`".into(),
        ));
    }

    let config = context.projection_config();
    let snapshot = context.snapshot()?;
    let mut projected = project_all(
        &snapshot.recurrences,
        &snapshot.automations,
        &snapshot.streams,
        from,
        to,
        &config,
    );
    if let Some(stream) = flags.get("stream") {
        projected.retain(|entry| entry.stream_id == stream);
    }

    if projected.is_empty() {
        output::info(format!("Nothing projected between {from} and {to}."));
        return Ok(());
    }

    let rows: Vec<Vec<String>> = projected
        .iter()
        .map(|entry| {
            let currency = entry
                .currency
                .clone()
                .unwrap_or_else(|| config.fallback_currency.clone());
            let kind = match entry.kind {
                TransactionKind::Income => "income",
                TransactionKind::Expense => "expense",
            };
            vec![
                entry.applicability_date.to_string(),
                snapshot.stream_name(&entry.stream_id).to_string(),
                kind.to_string(),
                format_currency_value(entry.amount, &currency),
                entry.description.clone().unwrap_or_default(),
            ]
        })
        .collect();

    output::section(format!("Projected {from} to {to}"));
    output::info(render_table(
        &["Date", "Stream", "Type", "Amount", "Description"],
        &rows,
    ));
    if to > config.horizon_end() {
        output::warning(format!(
            "Projections stop at the horizon ({}).",
            config.horizon_end()
        ));
    }
    Ok(())
}
