use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    currency::CurrencyCode,
    errors::{Result, VaultError},
};

use super::transaction::TransactionKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
    Monthly,
    Weekly,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub frequency: ScheduleFrequency,
    /// Day of month for monthly schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
}

impl Schedule {
    pub fn monthly(day: u32) -> Self {
        Self {
            frequency: ScheduleFrequency::Monthly,
            day: Some(day),
            start_date: None,
            end_date: None,
            occurrences: None,
        }
    }

    pub fn manual() -> Self {
        Self {
            frequency: ScheduleFrequency::Manual,
            day: None,
            start_date: None,
            end_date: None,
            occurrences: None,
        }
    }

    /// The day a monthly schedule fires on; `None` for anything that is not
    /// projected or run automatically.
    pub fn monthly_day(&self) -> Option<u32> {
        match self.frequency {
            ScheduleFrequency::Monthly => self.day,
            ScheduleFrequency::Weekly | ScheduleFrequency::Manual => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarningSlot {
    pub occurrence: u32,
    /// Fraction of the pot paid out on that cycle.
    pub portion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingCircle {
    pub total_occurrences: u32,
    #[serde(default)]
    pub earning_schedule: Vec<EarningSlot>,
}

/// Automation type with the stream roles each variant needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationKind {
    Salary {
        target_stream_id: String,
    },
    Transfer {
        source_stream_id: String,
        target_stream_id: String,
    },
    CcPayment {
        source_stream_id: String,
        target_stream_id: String,
    },
    Installment {
        source_stream_id: String,
    },
    SavingCircle {
        source_stream_id: String,
        saving_circle: SavingCircle,
    },
}

impl AutomationKind {
    pub fn label(&self) -> &'static str {
        match self {
            AutomationKind::Salary { .. } => "salary",
            AutomationKind::Transfer { .. } => "transfer",
            AutomationKind::CcPayment { .. } => "cc_payment",
            AutomationKind::Installment { .. } => "installment",
            AutomationKind::SavingCircle { .. } => "saving_circle",
        }
    }

    pub fn source_stream_id(&self) -> Option<&str> {
        let id = match self {
            AutomationKind::Salary { .. } => return None,
            AutomationKind::Transfer {
                source_stream_id, ..
            }
            | AutomationKind::CcPayment {
                source_stream_id, ..
            }
            | AutomationKind::Installment { source_stream_id }
            | AutomationKind::SavingCircle {
                source_stream_id, ..
            } => source_stream_id,
        };
        non_empty(id)
    }

    pub fn target_stream_id(&self) -> Option<&str> {
        let id = match self {
            AutomationKind::Salary { target_stream_id }
            | AutomationKind::Transfer {
                target_stream_id, ..
            }
            | AutomationKind::CcPayment {
                target_stream_id, ..
            } => target_stream_id,
            AutomationKind::Installment { .. } | AutomationKind::SavingCircle { .. } => {
                return None
            }
        };
        non_empty(id)
    }
}

fn non_empty(id: &str) -> Option<&str> {
    if id.trim().is_empty() {
        None
    } else {
        Some(id)
    }
}

/// One side of an automation occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationLeg<'a> {
    pub stream_id: &'a str,
    pub kind: TransactionKind,
}

/// A scheduled cross-stream rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Automation {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: AutomationKind,
    pub amount: f64,
    /// Overrides the currency of the streams involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    pub schedule: Schedule,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub requires_confirmation: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Automation {
    pub fn new(
        name: impl Into<String>,
        kind: AutomationKind,
        amount: f64,
        schedule: Schedule,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            amount,
            currency: None,
            schedule,
            is_active: true,
            requires_confirmation: false,
            created_at,
            last_run_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Legs an occurrence produces. Missing stream roles drop their leg;
    /// installments and saving circles produce none.
    pub fn legs(&self) -> Vec<AutomationLeg<'_>> {
        let mut legs = Vec::with_capacity(2);
        match &self.kind {
            AutomationKind::Salary { .. } => {
                if let Some(target) = self.kind.target_stream_id() {
                    legs.push(AutomationLeg {
                        stream_id: target,
                        kind: TransactionKind::Income,
                    });
                }
            }
            AutomationKind::Transfer { .. } | AutomationKind::CcPayment { .. } => {
                if let Some(source) = self.kind.source_stream_id() {
                    legs.push(AutomationLeg {
                        stream_id: source,
                        kind: TransactionKind::Expense,
                    });
                }
                if let Some(target) = self.kind.target_stream_id() {
                    legs.push(AutomationLeg {
                        stream_id: target,
                        kind: TransactionKind::Income,
                    });
                }
            }
            AutomationKind::Installment { .. } | AutomationKind::SavingCircle { .. } => {}
        }
        legs
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VaultError::validation("automation requires a name"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(VaultError::validation(format!(
                "automation amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        let kind = self.kind.label();
        match &self.kind {
            AutomationKind::Salary { target_stream_id } => {
                require_stream(kind, "target", target_stream_id)?;
            }
            AutomationKind::Transfer {
                source_stream_id,
                target_stream_id,
            }
            | AutomationKind::CcPayment {
                source_stream_id,
                target_stream_id,
            } => {
                require_stream(kind, "source", source_stream_id)?;
                require_stream(kind, "target", target_stream_id)?;
                if source_stream_id == target_stream_id {
                    return Err(VaultError::validation(format!(
                        "{} must move money between two different streams",
                        kind
                    )));
                }
            }
            AutomationKind::Installment { source_stream_id } => {
                require_stream(kind, "source", source_stream_id)?;
            }
            AutomationKind::SavingCircle {
                source_stream_id,
                saving_circle,
            } => {
                require_stream(kind, "source", source_stream_id)?;
                if saving_circle.total_occurrences == 0 {
                    return Err(VaultError::validation(
                        "saving circle needs at least one occurrence",
                    ));
                }
                for slot in &saving_circle.earning_schedule {
                    if !(slot.portion > 0.0 && slot.portion <= 1.0) {
                        return Err(VaultError::validation(format!(
                            "earning portion for occurrence {} must be within (0, 1]",
                            slot.occurrence
                        )));
                    }
                }
            }
        }
        if self.schedule.frequency == ScheduleFrequency::Monthly {
            match self.schedule.day {
                Some(day) if (1..=31).contains(&day) => {}
                other => {
                    return Err(VaultError::validation(format!(
                        "monthly schedules need a day between 1 and 31, got {:?}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }
}

fn require_stream(kind: &str, role: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(VaultError::validation(format!(
            "{} automation requires a {} stream",
            kind, role
        )));
    }
    Ok(())
}
