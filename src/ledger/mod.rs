//! Data model: streams, transactions, recurrence rules, and automations.

pub mod automation;
pub mod recurrence;
pub mod stream;
pub mod time_interval;
pub mod transaction;

pub use automation::{
    Automation, AutomationKind, AutomationLeg, EarningSlot, SavingCircle, Schedule,
    ScheduleFrequency,
};
pub use recurrence::{Frequency, Recurrence};
pub use stream::Stream;
pub use time_interval::{TimeInterval, TimeUnit};
pub use transaction::{
    Movement, NewTransaction, ProjectedTransaction, TimelineEntry, Transaction, TransactionKind,
};
