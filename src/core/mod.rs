pub mod runner;
pub mod services;
pub mod time;

pub use runner::{AutomationRunner, CatchUpPolicy, FiredAutomation, RunReport, SkipReason};
pub use time::{Clock, FixedClock, SystemClock};
