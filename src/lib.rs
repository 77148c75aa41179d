#![doc(test(attr(deny(warnings))))]

//! Finance Vault projects a personal ledger forward in time: recurrence
//! rules and automations expand into dated transactions, and balance
//! reductions answer "what will I have on day X" across currencies.

pub mod balance;
pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod projection;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::balance::{BalanceCalculator, BalanceReport};
pub use crate::config::{Config, ConfigManager};
pub use crate::core::{AutomationRunner, CatchUpPolicy, Clock, FixedClock, RunReport, SystemClock};
pub use crate::currency::{CurrencyCode, RateTable};
pub use crate::errors::VaultError;
pub use crate::projection::ProjectionConfig;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("finance_vault tracing initialized");
    });
}
