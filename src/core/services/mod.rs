pub mod automation_service;
pub mod rate_service;
pub mod recurrence_service;
pub mod settings_service;
pub mod stream_service;
pub mod transaction_service;

pub use automation_service::AutomationService;
pub use rate_service::RateService;
pub use recurrence_service::RecurrenceService;
pub use settings_service::SettingsService;
pub use stream_service::StreamService;
pub use transaction_service::TransactionService;
