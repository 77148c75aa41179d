use std::collections::BTreeMap;

use strsim::levenshtein;

use super::context::{CliContext, CommandResult};

pub(crate) type CommandHandler = fn(&mut CliContext, &[&str]) -> CommandResult;

/// Largest edit distance still offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Clone)]
pub(crate) struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

#[derive(Default)]
pub(crate) struct CommandRegistry {
    entries: BTreeMap<&'static str, CommandEntry>,
}

impl CommandRegistry {
    pub fn register(&mut self, entry: CommandEntry) {
        self.entries.insert(entry.name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values()
    }

    /// Closest registered name to `input`, if it is close enough to be a typo.
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        self.entries
            .keys()
            .map(|name| (levenshtein(name, input), *name))
            .min_by_key(|(distance, _)| *distance)
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .map(|(_, name)| name)
    }
}
