use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    core::{
        services::{AutomationService, RateService, RecurrenceService, StreamService, TransactionService},
        time::{Clock, SystemClock},
    },
    currency::{CurrencyCode, RateTable},
    errors::VaultError,
    ledger::{Automation, Recurrence, Stream, TimelineEntry, Transaction},
    projection::{merge_with_real, project_all, ProjectionConfig},
    storage::json_backend::JsonStore,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error(transparent)]
    Vault(#[from] VaultError),
}

pub type CommandResult = Result<(), CommandError>;

/// Everything a command handler needs: the store, the loaded settings and
/// the clock that defines "today".
pub struct CliContext {
    pub store: JsonStore,
    pub config: Config,
    pub clock: Box<dyn Clock>,
}

impl CliContext {
    /// Opens the store and config under the application data directory.
    pub fn open() -> Result<Self, CommandError> {
        let config = ConfigManager::new()?.load()?;
        let store = JsonStore::new_default()?;
        Ok(Self::new(store, config, Box::new(SystemClock)))
    }

    pub fn new(store: JsonStore, config: Config, clock: Box<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn projection_config(&self) -> ProjectionConfig {
        self.config.projection(self.clock.as_ref())
    }

    pub fn snapshot(&self) -> Result<Snapshot, CommandError> {
        Ok(Snapshot {
            streams: StreamService::list_all(&self.store)?,
            transactions: TransactionService::list(&self.store)?,
            recurrences: RecurrenceService::list(&self.store)?,
            automations: AutomationService::list(&self.store)?,
            rates: RateService::rate_table(&self.store)?,
        })
    }
}

/// One consistent read of every store a report needs.
pub struct Snapshot {
    pub streams: Vec<Stream>,
    pub transactions: Vec<Transaction>,
    pub recurrences: Vec<Recurrence>,
    pub automations: Vec<Automation>,
    pub rates: RateTable,
}

impl Snapshot {
    /// Real transactions plus projections from tomorrow through the horizon.
    /// Today is left to the runner so a materialised occurrence is not
    /// counted twice.
    pub fn timeline(&self, config: &ProjectionConfig) -> Vec<TimelineEntry> {
        let from = config.today.succ_opt().unwrap_or(config.today);
        let projected = project_all(
            &self.recurrences,
            &self.automations,
            &self.streams,
            from,
            config.horizon_end(),
            config,
        );
        merge_with_real(&self.transactions, projected)
    }

    pub fn stream_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.streams
            .iter()
            .find(|stream| stream.id == id)
            .map(|stream| stream.name.as_str())
            .unwrap_or(id)
    }
}

/// `--name value` pairs restricted to a known set of names.
pub struct Flags<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> Flags<'a> {
    pub fn parse(args: &[&'a str], allowed: &[&str]) -> Result<Self, CommandError> {
        let mut values = HashMap::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                return Err(CommandError::InvalidArguments(format!(
                    "unexpected argument `{arg}`"
                )));
            };
            if !allowed.contains(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{name}`"
                )));
            }
            let Some(value) = iter.next() else {
                return Err(CommandError::InvalidArguments(format!(
                    "option `--{name}` needs a value"
                )));
            };
            values.insert(name, *value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.values.get(name).copied()
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, CommandError> {
        self.get(name)
            .map(|value| {
                NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
                    CommandError::InvalidArguments(format!(
                        "`--{name}` expects a date like 2025-01-31, got `{value}`"
                    ))
                })
            })
            .transpose()
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, CommandError> {
        self.date(name)?.ok_or_else(|| {
            CommandError::InvalidArguments(format!("missing required option `--{name}`"))
        })
    }

    pub fn currency(&self, name: &str) -> Option<CurrencyCode> {
        self.get(name)
            .map(CurrencyCode::new)
            .filter(|code| !code.is_empty())
    }
}
