use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Applies the direction of the movement to a stored magnitude.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

/// Common read access over real and projected money movements so the
/// balance reductions can run over either list, or a merged timeline.
pub trait Movement {
    fn stream_id(&self) -> &str;
    fn amount(&self) -> f64;
    /// `None` while a projected entry still waits for its stream currency.
    fn currency(&self) -> Option<&CurrencyCode>;
    fn applicability_date(&self) -> NaiveDate;
    fn kind(&self) -> TransactionKind;

    fn is_projected(&self) -> bool {
        false
    }

    fn signed_amount(&self) -> f64 {
        self.kind().signed(self.amount())
    }
}

/// Everything needed to record a transaction; the store assigns identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    pub stream_id: String,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub applicability_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(
        stream_id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        currency: CurrencyCode,
        applicability_date: NaiveDate,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            amount: amount.abs(),
            currency,
            applicability_date,
            kind,
            tags: Vec::new(),
            recurrence_id: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A persisted money movement. Amounts are always stored as magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub stream_id: String,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub applicability_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn record(draft: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stream_id: draft.stream_id,
            amount: draft.amount.abs(),
            currency: draft.currency,
            applicability_date: draft.applicability_date,
            created_at,
            kind: draft.kind,
            tags: draft.tags,
            recurrence_id: draft.recurrence_id,
            description: draft.description,
        }
    }
}

impl Movement for Transaction {
    fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn currency(&self) -> Option<&CurrencyCode> {
        Some(&self.currency)
    }

    fn applicability_date(&self) -> NaiveDate {
        self.applicability_date
    }

    fn kind(&self) -> TransactionKind {
        self.kind
    }
}

/// A synthetic occurrence produced by expanding a recurrence or automation.
/// Never persisted, never mutated after the enrichment stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectedTransaction {
    pub stream_id: String,
    pub amount: f64,
    /// Left empty by the recurrence expander; filled from the owning
    /// stream by [`ProjectedTransaction::resolve_currency`].
    pub currency: Option<CurrencyCode>,
    pub applicability_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub tags: Vec<String>,
    pub recurrence_id: Option<String>,
    pub description: Option<String>,
    /// Generation timestamp; only useful for cache busting.
    pub projection_date: DateTime<Utc>,
}

impl ProjectedTransaction {
    pub fn resolve_currency(mut self, currency: Option<&CurrencyCode>) -> Self {
        if self.currency.is_none() {
            self.currency = currency.cloned();
        }
        self
    }
}

impl Movement for ProjectedTransaction {
    fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn currency(&self) -> Option<&CurrencyCode> {
        self.currency.as_ref()
    }

    fn applicability_date(&self) -> NaiveDate {
        self.applicability_date
    }

    fn kind(&self) -> TransactionKind {
        self.kind
    }

    fn is_projected(&self) -> bool {
        true
    }
}

/// One row of a merged real-plus-projected timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Real(Transaction),
    Projected(ProjectedTransaction),
}

impl TimelineEntry {
    fn inner(&self) -> &dyn Movement {
        match self {
            TimelineEntry::Real(txn) => txn,
            TimelineEntry::Projected(projected) => projected,
        }
    }

    pub fn as_real(&self) -> Option<&Transaction> {
        match self {
            TimelineEntry::Real(txn) => Some(txn),
            TimelineEntry::Projected(_) => None,
        }
    }

    pub fn as_projected(&self) -> Option<&ProjectedTransaction> {
        match self {
            TimelineEntry::Real(_) => None,
            TimelineEntry::Projected(projected) => Some(projected),
        }
    }
}

impl Movement for TimelineEntry {
    fn stream_id(&self) -> &str {
        self.inner().stream_id()
    }

    fn amount(&self) -> f64 {
        self.inner().amount()
    }

    fn currency(&self) -> Option<&CurrencyCode> {
        self.inner().currency()
    }

    fn applicability_date(&self) -> NaiveDate {
        self.inner().applicability_date()
    }

    fn kind(&self) -> TransactionKind {
        self.inner().kind()
    }

    fn is_projected(&self) -> bool {
        self.inner().is_projected()
    }
}
