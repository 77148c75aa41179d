use crate::cli::context::{CliContext, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show version information", "version", cmd_version),
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
    ]
}

fn cmd_version(_context: &mut CliContext, _args: &[&str]) -> CommandResult {
    output::info(format!("finance_vault {}", env!("CARGO_PKG_VERSION")));
    Ok(())
}

fn cmd_help(_context: &mut CliContext, args: &[&str]) -> CommandResult {
    crate::cli::print_help(args.first().copied());
    Ok(())
}
