use crate::cli::context::{CliContext, CommandResult, Flags};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::core::runner::AutomationRunner;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "run-automations",
        "Record today's due automations as transactions",
        "run-automations",
        cmd_run_automations,
    )]
}

fn cmd_run_automations(context: &mut CliContext, args: &[&str]) -> CommandResult {
    Flags::parse(args, &[])?;
    let runner =
        AutomationRunner::from_config(&context.store, context.clock.as_ref(), &context.config);
    let report = runner.run()?;

    output::section(format!("Automations for {}", context.today()));
    output::success(format!(
        "{} fired, {} transactions recorded",
        report.fired.len(),
        report.transactions_created()
    ));
    output::info(format!("{} skipped", report.skipped.len()));
    for (id, message) in &report.failed {
        output::error(format!("{id}: {message}"));
    }
    Ok(())
}
