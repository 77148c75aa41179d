use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;

/// A named money container: bank account, cash, wallet, or credit card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stream {
    pub id: String,
    pub name: String,
    pub icon: String,
    base_currency: CurrencyCode,
    #[serde(default)]
    pub is_credit_card: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
    /// Liability baseline recorded when the card was added, kept apart from
    /// transaction history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_usage: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Stream {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, base_currency: CurrencyCode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            icon: icon.into(),
            base_currency,
            is_credit_card: false,
            credit_limit: None,
            current_usage: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn credit_card(
        name: impl Into<String>,
        base_currency: CurrencyCode,
        credit_limit: f64,
        current_usage: f64,
    ) -> Self {
        let mut stream = Self::new(name, "card", base_currency);
        stream.is_credit_card = true;
        stream.credit_limit = Some(credit_limit);
        stream.current_usage = Some(current_usage);
        stream
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Credit figures only count for streams flagged as cards.
    pub fn credit_limit(&self) -> Option<f64> {
        if self.is_credit_card {
            self.credit_limit
        } else {
            None
        }
    }

    pub fn usage_baseline(&self) -> f64 {
        if self.is_credit_card {
            self.current_usage.unwrap_or(0.0)
        } else {
            0.0
        }
    }
}
