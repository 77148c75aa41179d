//! Turns automations due today into real transactions.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::core::services::{AutomationService, TransactionService};
use crate::core::time::Clock;
use crate::currency::CurrencyCode;
use crate::errors::Result;
use crate::ledger::{Automation, AutomationKind, AutomationLeg, NewTransaction, ScheduleFrequency, Stream};
use crate::storage::{Store, StoreExt};

/// What a run does about matching days that passed while nothing ran.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CatchUpPolicy {
    /// Only today is considered; missed days are never materialised.
    #[default]
    SkipMissed,
    /// Also materialise matching days after the last run (or creation), at
    /// most `max_days` back from today.
    Backfill { max_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    NotMonthly,
    NoScheduledDay,
    NotDue,
    AlreadyRanToday,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiredAutomation {
    pub automation_id: String,
    pub dates: Vec<NaiveDate>,
    pub transaction_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub fired: Vec<FiredAutomation>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn transactions_created(&self) -> usize {
        self.fired.iter().map(|fired| fired.transaction_ids.len()).sum()
    }
}

pub struct AutomationRunner<'a, S: Store + ?Sized> {
    store: &'a S,
    clock: &'a dyn Clock,
    fallback_currency: CurrencyCode,
    catch_up: CatchUpPolicy,
}

impl<'a, S: Store + ?Sized> AutomationRunner<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            fallback_currency: CurrencyCode::default(),
            catch_up: CatchUpPolicy::default(),
        }
    }

    pub fn from_config(store: &'a S, clock: &'a dyn Clock, config: &Config) -> Self {
        Self::new(store, clock)
            .with_fallback_currency(config.fallback_currency.clone())
            .with_catch_up(config.catch_up)
    }

    pub fn with_fallback_currency(mut self, currency: CurrencyCode) -> Self {
        self.fallback_currency = currency;
        self
    }

    pub fn with_catch_up(mut self, policy: CatchUpPolicy) -> Self {
        self.catch_up = policy;
        self
    }

    /// Processes every automation one after another. A failure is recorded
    /// for that automation and the loop moves on; only loading the
    /// automation list itself can fail the run.
    pub fn run(&self) -> Result<RunReport> {
        let automations = AutomationService::list(self.store)?;
        let today = self.clock.today();
        let mut report = RunReport::default();

        for automation in &automations {
            let dates = match self.due_dates(automation, today) {
                Ok(dates) => dates,
                Err(reason) => {
                    debug!(automation = %automation.id, ?reason, "automation skipped");
                    report.skipped.push((automation.id.clone(), reason));
                    continue;
                }
            };
            match self.fire(automation, &dates) {
                Ok(transaction_ids) => {
                    info!(
                        automation = %automation.id,
                        occurrences = dates.len(),
                        transactions = transaction_ids.len(),
                        "automation fired"
                    );
                    report.fired.push(FiredAutomation {
                        automation_id: automation.id.clone(),
                        dates,
                        transaction_ids,
                    });
                }
                Err(err) => {
                    error!(automation = %automation.id, error = %err, "automation run failed");
                    report.failed.push((automation.id.clone(), err.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Dates this automation should materialise on this run, oldest first.
    pub fn due_dates(
        &self,
        automation: &Automation,
        today: NaiveDate,
    ) -> std::result::Result<Vec<NaiveDate>, SkipReason> {
        if !automation.is_active {
            return Err(SkipReason::Inactive);
        }
        if automation.schedule.frequency != ScheduleFrequency::Monthly {
            return Err(SkipReason::NotMonthly);
        }
        let day = automation
            .schedule
            .monthly_day()
            .ok_or(SkipReason::NoScheduledDay)?;
        let last_run = automation.last_run_at.map(|at| at.date_naive());
        if last_run == Some(today) {
            return Err(SkipReason::AlreadyRanToday);
        }

        let mut dates = Vec::new();
        if let CatchUpPolicy::Backfill { max_days } = self.catch_up {
            let after = last_run.unwrap_or_else(|| automation.created_at.date_naive());
            let earliest = today
                .checked_sub_days(Days::new(max_days.into()))
                .unwrap_or(NaiveDate::MIN);
            let start = after.succ_opt().unwrap_or(after).max(earliest);
            dates.extend(
                start
                    .iter_days()
                    .take_while(|candidate| *candidate < today)
                    .filter(|candidate| candidate.day() == day),
            );
        }
        if today.day() == day {
            dates.push(today);
        }

        if dates.is_empty() {
            Err(SkipReason::NotDue)
        } else {
            Ok(dates)
        }
    }

    fn fire(&self, automation: &Automation, dates: &[NaiveDate]) -> Result<Vec<String>> {
        let legs = Self::runnable_legs(automation);
        let mut created = Vec::with_capacity(legs.len() * dates.len());
        for date in dates {
            for leg in &legs {
                let currency = self.leg_currency(automation, leg)?;
                let draft = NewTransaction::new(
                    leg.stream_id,
                    leg.kind,
                    automation.amount,
                    currency,
                    *date,
                )
                .with_description(automation.name.clone());
                let transaction = TransactionService::create(self.store, draft, self.clock)?;
                created.push(transaction.id);
            }
        }
        AutomationService::set_last_run(self.store, &automation.id, self.clock.now())?;
        Ok(created)
    }

    /// Card payments only move money when both sides are known.
    fn runnable_legs(automation: &Automation) -> Vec<AutomationLeg<'_>> {
        let legs = automation.legs();
        match automation.kind {
            AutomationKind::CcPayment { .. } if legs.len() < 2 => Vec::new(),
            _ => legs,
        }
    }

    fn leg_currency(&self, automation: &Automation, leg: &AutomationLeg<'_>) -> Result<CurrencyCode> {
        if let Some(currency) = automation.currency.as_ref().filter(|c| !c.is_empty()) {
            return Ok(currency.clone());
        }
        let stream = self.store.get::<Stream>(leg.stream_id)?;
        Ok(stream
            .map(|stream| stream.base_currency().clone())
            .unwrap_or_else(|| self.fallback_currency.clone()))
    }
}
