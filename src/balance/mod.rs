//! Date-scoped balance reductions over real, projected, or merged
//! transaction lists.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
    currency::{ConversionAudit, CurrencyCode, RateTable},
    ledger::{Movement, Stream, TransactionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IncomeExpense {
    pub income: f64,
    pub expense: f64,
}

impl IncomeExpense {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCredit {
    pub stream_id: String,
    pub name: String,
    pub credit_limit: f64,
    /// Baseline plus net spending up to the cutoff. Not clamped.
    pub usage: f64,
    pub available: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreditSummary {
    pub cards: Vec<CardCredit>,
    pub total_limit: f64,
    pub total_usage: f64,
    pub total_available: f64,
}

/// Headline figures for one cutoff date.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub as_of: NaiveDate,
    pub currency: Option<CurrencyCode>,
    pub money_in_hand: f64,
    pub projected_money: f64,
    pub credit: CreditSummary,
    /// Money in hand on non-card streams minus card liability.
    pub net_position: f64,
    pub audit: ConversionAudit,
}

/// Pure reductions over a transaction list. Amounts are converted into the
/// target currency when one is set; without a target nothing is converted.
#[derive(Debug, Clone, Copy)]
pub struct BalanceCalculator<'a> {
    rates: &'a RateTable,
    target: Option<&'a CurrencyCode>,
}

impl<'a> BalanceCalculator<'a> {
    pub fn new(rates: &'a RateTable) -> Self {
        Self {
            rates,
            target: None,
        }
    }

    pub fn with_target(rates: &'a RateTable, target: &'a CurrencyCode) -> Self {
        Self {
            rates,
            target: Some(target),
        }
    }

    pub fn target(&self) -> Option<&CurrencyCode> {
        self.target
    }

    fn convert_amount(
        &self,
        amount: f64,
        currency: Option<&CurrencyCode>,
        audit: &mut ConversionAudit,
    ) -> f64 {
        match (self.target, currency) {
            (Some(target), Some(from)) if !from.is_empty() => {
                audit.convert(amount, from, target, self.rates)
            }
            _ => amount,
        }
    }

    fn signed_sum<'m, M, I>(&self, movements: I, audit: &mut ConversionAudit) -> f64
    where
        M: Movement + 'm,
        I: IntoIterator<Item = &'m M>,
    {
        movements.into_iter().fold(0.0, |sum, movement| {
            let amount = self.convert_amount(movement.amount(), movement.currency(), audit);
            sum + movement.kind().signed(amount)
        })
    }

    /// Net of everything effective on or before `date`.
    pub fn money_in_hand<M: Movement>(&self, movements: &[M], date: NaiveDate) -> f64 {
        self.money_in_hand_audited(movements, date, &mut ConversionAudit::new())
    }

    pub fn money_in_hand_audited<M: Movement>(
        &self,
        movements: &[M],
        date: NaiveDate,
        audit: &mut ConversionAudit,
    ) -> f64 {
        self.signed_sum(
            movements.iter().filter(|m| m.applicability_date() <= date),
            audit,
        )
    }

    /// Net of everything effective strictly after `date`.
    pub fn projected_money<M: Movement>(&self, movements: &[M], date: NaiveDate) -> f64 {
        self.projected_money_audited(movements, date, &mut ConversionAudit::new())
    }

    pub fn projected_money_audited<M: Movement>(
        &self,
        movements: &[M],
        date: NaiveDate,
        audit: &mut ConversionAudit,
    ) -> f64 {
        self.signed_sum(
            movements.iter().filter(|m| m.applicability_date() > date),
            audit,
        )
    }

    pub fn total_balance<M: Movement>(&self, movements: &[M]) -> f64 {
        self.signed_sum(movements.iter(), &mut ConversionAudit::new())
    }

    /// Net of one stream up to `date`, in the stream's own currency.
    pub fn stream_balance<M: Movement>(movements: &[M], stream_id: &str, date: NaiveDate) -> f64 {
        movements
            .iter()
            .filter(|m| m.stream_id() == stream_id && m.applicability_date() <= date)
            .map(|m| m.signed_amount())
            .sum()
    }

    /// Unconverted balance per stream up to `date`.
    pub fn stream_balances<M: Movement>(movements: &[M], date: NaiveDate) -> BTreeMap<String, f64> {
        let mut balances = BTreeMap::new();
        for movement in movements.iter().filter(|m| m.applicability_date() <= date) {
            *balances
                .entry(movement.stream_id().to_string())
                .or_insert(0.0) += movement.signed_amount();
        }
        balances
    }

    /// Money in hand sampled every `interval_days` from `start` through `end`.
    pub fn balance_over_time<M: Movement>(
        &self,
        movements: &[M],
        start: NaiveDate,
        end: NaiveDate,
        interval_days: u32,
    ) -> Vec<BalancePoint> {
        let step = Days::new(interval_days.max(1).into());
        let mut points = Vec::new();
        let mut audit = ConversionAudit::new();
        let mut next = Some(start);
        while let Some(current) = next.filter(|date| *date <= end) {
            points.push(BalancePoint {
                date: current,
                balance: self.money_in_hand_audited(movements, current, &mut audit),
            });
            next = current.checked_add_days(step);
        }
        points
    }

    /// Converted income and expense totals for `[start, end]`.
    pub fn income_vs_expense<M: Movement>(
        &self,
        movements: &[M],
        start: NaiveDate,
        end: NaiveDate,
    ) -> IncomeExpense {
        let mut audit = ConversionAudit::new();
        let mut totals = IncomeExpense::default();
        for movement in movements {
            let date = movement.applicability_date();
            if date < start || date > end {
                continue;
            }
            let amount = self.convert_amount(movement.amount(), movement.currency(), &mut audit);
            match movement.kind() {
                TransactionKind::Income => totals.income += amount,
                TransactionKind::Expense => totals.expense += amount,
            }
        }
        totals
    }

    /// Card usage at `date`: stored baseline plus expenses minus payments.
    pub fn credit_usage<M: Movement>(&self, card: &Stream, movements: &[M], date: NaiveDate) -> f64 {
        self.credit_usage_audited(card, movements, date, &mut ConversionAudit::new())
    }

    fn credit_usage_audited<M: Movement>(
        &self,
        card: &Stream,
        movements: &[M],
        date: NaiveDate,
        audit: &mut ConversionAudit,
    ) -> f64 {
        let baseline =
            self.convert_amount(card.usage_baseline(), Some(card.base_currency()), audit);
        let spent = -self.signed_sum(
            movements
                .iter()
                .filter(|m| m.stream_id() == card.id && m.applicability_date() <= date),
            audit,
        );
        baseline + spent
    }

    pub fn credit_summary<M: Movement>(
        &self,
        streams: &[Stream],
        movements: &[M],
        date: NaiveDate,
    ) -> CreditSummary {
        self.credit_summary_audited(streams, movements, date, &mut ConversionAudit::new())
    }

    fn credit_summary_audited<M: Movement>(
        &self,
        streams: &[Stream],
        movements: &[M],
        date: NaiveDate,
        audit: &mut ConversionAudit,
    ) -> CreditSummary {
        let mut summary = CreditSummary::default();
        for card in streams.iter().filter(|s| s.is_credit_card) {
            let credit_limit = card
                .credit_limit()
                .map(|limit| self.convert_amount(limit, Some(card.base_currency()), audit))
                .unwrap_or(0.0);
            let usage = self.credit_usage_audited(card, movements, date, audit);
            summary.total_limit += credit_limit;
            summary.total_usage += usage;
            summary.cards.push(CardCredit {
                stream_id: card.id.clone(),
                name: card.name.clone(),
                credit_limit,
                usage,
                available: credit_limit - usage,
            });
        }
        summary.total_available = summary.total_limit - summary.total_usage;
        summary
    }

    /// Money in hand outside credit cards, minus what the cards owe.
    pub fn net_position<M: Movement>(&self, streams: &[Stream], movements: &[M], date: NaiveDate) -> f64 {
        let mut audit = ConversionAudit::new();
        let credit = self.credit_summary_audited(streams, movements, date, &mut audit);
        self.asset_balance(streams, movements, date, &mut audit) - credit.total_usage
    }

    fn asset_balance<M: Movement>(
        &self,
        streams: &[Stream],
        movements: &[M],
        date: NaiveDate,
        audit: &mut ConversionAudit,
    ) -> f64 {
        let cards: HashSet<&str> = streams
            .iter()
            .filter(|s| s.is_credit_card)
            .map(|s| s.id.as_str())
            .collect();
        self.signed_sum(
            movements
                .iter()
                .filter(|m| m.applicability_date() <= date && !cards.contains(m.stream_id())),
            audit,
        )
    }

    /// All headline figures at once, with one audit covering every conversion.
    pub fn report<M: Movement>(&self, streams: &[Stream], movements: &[M], date: NaiveDate) -> BalanceReport {
        let mut audit = ConversionAudit::new();
        let money_in_hand = self.money_in_hand_audited(movements, date, &mut audit);
        let projected_money = self.projected_money_audited(movements, date, &mut audit);
        let credit = self.credit_summary_audited(streams, movements, date, &mut audit);
        let net_position = self.asset_balance(streams, movements, date, &mut audit) - credit.total_usage;
        BalanceReport {
            as_of: date,
            currency: self.target.cloned(),
            money_in_hand,
            projected_money,
            credit,
            net_position,
            audit,
        }
    }
}
