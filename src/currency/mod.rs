pub mod provider;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use provider::{CachedRateProvider, FetchedRate, RateFetcher};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

/// Currencies the app keeps fresh rates for against the primary currency.
pub const COMMON_CURRENCIES: [CurrencyInfo; 4] = [
    CurrencyInfo {
        code: "USD",
        name: "US Dollar",
        symbol: "$",
    },
    CurrencyInfo {
        code: "EGP",
        name: "Egyptian Pound",
        symbol: "£",
    },
    CurrencyInfo {
        code: "SAR",
        name: "Saudi Riyal",
        symbol: "⃁",
    },
    CurrencyInfo {
        code: "EUR",
        name: "Euro",
        symbol: "€",
    },
];

static CURRENCY_INDEX: Lazy<HashMap<&'static str, CurrencyInfo>> = Lazy::new(|| {
    COMMON_CURRENCIES
        .iter()
        .map(|info| (info.code, *info))
        .collect()
});

pub fn currency_info(code: &str) -> Option<CurrencyInfo> {
    CURRENCY_INDEX.get(code).copied()
}

pub fn symbol_for(code: &str) -> String {
    match currency_info(code) {
        Some(info) => info.symbol.into(),
        None => match code {
            "GBP" => "£".into(),
            "JPY" => "¥".into(),
            _ => code.into(),
        },
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "JPY" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Renders `amount` with the currency symbol, grouped thousands and the
/// currency's minor units, e.g. `-$1,234.50`.
pub fn format_currency_value(amount: f64, code: &CurrencyCode) -> String {
    let precision = minor_units_for(code.as_str()) as usize;
    let body = format!("{:.*}", precision, amount.abs());
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => (&body[..pos], &body[pos..]),
        None => (body.as_str(), ""),
    };
    let sign = if amount < 0.0 { "-" } else { "" };
    format!(
        "{}{}{}{}",
        sign,
        symbol_for(code.as_str()),
        group_digits(int_part),
        frac_part
    )
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, ',');
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// A cached exchange rate: one unit of `from_currency` buys `rate` units of
/// `to_currency` on `date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateEntry {
    pub id: String,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub rate: f64,
    pub date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

impl RateEntry {
    pub fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: f64,
        date: NaiveDate,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::cache_id(&from_currency, &to_currency, date),
            from_currency,
            to_currency,
            rate,
            date,
            fetched_at,
        }
    }

    /// `FROM_TO_YYYY-MM-DD`; at most one entry exists per pair and day.
    pub fn cache_id(from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> String {
        format!("{}_{}_{}", from, to, date.format("%Y-%m-%d"))
    }

    pub fn pair_key(&self) -> String {
        pair_key(&self.from_currency, &self.to_currency)
    }
}

pub fn pair_key(from: &CurrencyCode, to: &CurrencyCode) -> String {
    format!("{}_{}", from, to)
}

/// How a conversion was resolved against a [`RateTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    Parity,
    Direct(f64),
    Inverse(f64),
    Missing,
}

impl RateLookup {
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            RateLookup::Parity | RateLookup::Missing => amount,
            RateLookup::Direct(rate) => amount * rate,
            RateLookup::Inverse(rate) => amount / rate,
        }
    }
}

/// In-memory pair → rate mapping, rebuilt for every balance session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds cached entries in date order so the newest entry per pair wins.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a RateEntry>,
    {
        let mut sorted: Vec<&RateEntry> = entries.into_iter().collect();
        sorted.sort_by_key(|entry| entry.date);
        let mut table = Self::new();
        for entry in sorted {
            table.rates.insert(entry.pair_key(), entry.rate);
        }
        table
    }

    pub fn insert(&mut self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) {
        self.rates.insert(pair_key(from, to), rate);
    }

    pub fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        self.rates.get(&pair_key(from, to)).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn lookup(&self, from: &CurrencyCode, to: &CurrencyCode) -> RateLookup {
        if from == to {
            return RateLookup::Parity;
        }
        if let Some(rate) = self.rate(from, to) {
            return RateLookup::Direct(rate);
        }
        match self.rate(to, from) {
            Some(rate) if rate.abs() >= f64::EPSILON => RateLookup::Inverse(rate),
            _ => RateLookup::Missing,
        }
    }

    pub fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> f64 {
        convert(amount, from, to, self)
    }
}

/// Converts `amount` between currencies. Total: a missing rate in both
/// directions leaves the amount unchanged.
pub fn convert(amount: f64, from: &CurrencyCode, to: &CurrencyCode, table: &RateTable) -> f64 {
    let lookup = table.lookup(from, to);
    if lookup == RateLookup::Missing {
        debug!(from = %from, to = %to, "no rate for pair, converting 1:1");
    }
    lookup.apply(amount)
}

/// Collects every pair that fell back to 1:1 while computing an aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionAudit {
    missing: BTreeSet<(CurrencyCode, CurrencyCode)>,
}

impl ConversionAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts like [`convert`] and remembers pairs without a rate.
    pub fn convert(
        &mut self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
        table: &RateTable,
    ) -> f64 {
        let lookup = table.lookup(from, to);
        if lookup == RateLookup::Missing {
            debug!(from = %from, to = %to, "no rate for pair, converting 1:1");
            self.missing.insert((from.clone(), to.clone()));
        }
        lookup.apply(amount)
    }

    pub fn has_fallbacks(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn missing_pairs(&self) -> impl Iterator<Item = &(CurrencyCode, CurrencyCode)> {
        self.missing.iter()
    }

    pub fn warning(&self) -> Option<String> {
        if self.missing.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .missing
            .iter()
            .map(|(from, to)| format!("{} → {}", from, to))
            .collect();
        Some(format!(
            "No exchange rate for {}; amounts counted 1:1",
            pairs.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: &str) -> CurrencyCode {
        CurrencyCode::new(value)
    }

    fn entry(from: &str, to: &str, rate: f64, day: u32) -> RateEntry {
        RateEntry::new(
            code(from),
            code(to),
            rate,
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn latest_entry_per_pair_wins_regardless_of_input_order() {
        let entries = vec![entry("USD", "EGP", 50.0, 3), entry("USD", "EGP", 48.0, 1)];
        let table = RateTable::build(&entries);
        assert_eq!(table.rate(&code("USD"), &code("EGP")), Some(50.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn converts_direct_then_inverse() {
        let entries = vec![entry("EUR", "USD", 2.0, 1)];
        let table = RateTable::build(&entries);
        assert_eq!(convert(10.0, &code("EUR"), &code("USD"), &table), 20.0);
        assert_eq!(convert(10.0, &code("USD"), &code("EUR"), &table), 5.0);
        assert_eq!(convert(10.0, &code("USD"), &code("USD"), &table), 10.0);
    }

    #[test]
    fn missing_rate_is_one_to_one_and_audited() {
        let table = RateTable::new();
        assert_eq!(convert(12.5, &code("SAR"), &code("EUR"), &table), 12.5);

        let mut audit = ConversionAudit::new();
        assert_eq!(audit.convert(3.0, &code("SAR"), &code("EUR"), &table), 3.0);
        assert_eq!(audit.convert(3.0, &code("EUR"), &code("EUR"), &table), 3.0);
        assert!(audit.has_fallbacks());
        assert_eq!(audit.missing_pairs().count(), 1);
        assert!(audit.warning().unwrap().contains("SAR → EUR"));
    }

    #[test]
    fn cache_id_uses_pair_and_day() {
        let rate = entry("usd", "egp", 50.0, 9);
        assert_eq!(rate.id, "USD_EGP_2025-01-09");
    }

    #[test]
    fn formats_with_symbol_and_grouping() {
        assert_eq!(format_currency_value(1234.5, &code("USD")), "$1,234.50");
        assert_eq!(format_currency_value(-99.0, &code("EUR")), "-€99.00");
        assert_eq!(format_currency_value(1000.0, &code("JPY")), "¥1,000");
        assert_eq!(format_currency_value(5.0, &code("CHF")), "CHF5.00");
    }
}
