//! Non-interactive command front-end over the JSON store.

mod commands;
pub mod context;
pub mod output;
mod registry;

use std::env;

pub use context::{CliContext, CommandError, CommandResult};

use registry::CommandRegistry;

/// Runs the command named by the process arguments.
pub fn run_cli() -> CommandResult {
    let args: Vec<String> = env::args().skip(1).collect();
    run_with_args(&args)
}

pub fn run_with_args(args: &[String]) -> CommandResult {
    let Some((command, rest)) = args.split_first() else {
        print_help(None);
        return Ok(());
    };
    let mut context = CliContext::open()?;
    dispatch(&mut context, command, rest)
}

pub fn dispatch(context: &mut CliContext, command: &str, args: &[String]) -> CommandResult {
    let registry = commands::registry();
    let name = command.to_lowercase();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match registry.get(&name) {
        Some(entry) => (entry.handler)(context, &args),
        None => {
            suggest_command(&registry, command);
            Err(CommandError::UnknownCommand(command.to_string()))
        }
    }
}

fn suggest_command(registry: &CommandRegistry, input: &str) {
    output::warning(format!(
        "Unknown command `{}`. Type `help` to see available commands.",
        input
    ));
    if let Some(best) = registry.suggest(&input.to_lowercase()) {
        output::info(format!("Did you mean `{}`?", best));
    }
}

pub(crate) fn print_help(topic: Option<&str>) {
    let registry = commands::registry();
    if let Some(topic) = topic {
        match registry.get(&topic.to_lowercase()) {
            Some(entry) => {
                output::section(entry.name);
                output::info(entry.description);
                output::info(format!("Usage: {}", entry.usage));
            }
            None => suggest_command(&registry, topic),
        }
        return;
    }

    output::section("Available commands");
    let width = registry
        .entries()
        .map(|entry| entry.usage.len())
        .max()
        .unwrap_or(0);
    for entry in registry.entries() {
        output::info(format!(
            "  {:<width$}  {}",
            entry.usage,
            entry.description,
            width = width
        ));
    }
}
