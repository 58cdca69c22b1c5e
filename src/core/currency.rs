//! Currency codes, the supported allow-list and the rate provider abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A normalized currency code: surrounding whitespace removed, uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Self {
        CurrencyCode(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the code looks like an ISO 4217 code (three ASCII letters).
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 3 && self.0.chars().all(|c| c.is_ascii_alphabetic())
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// The fixed set of currencies the service accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCurrencies {
    codes: Vec<CurrencyCode>,
}

impl SupportedCurrencies {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<CurrencyCode> = Vec::new();
        for code in codes {
            let code = CurrencyCode::new(code.as_ref());
            if !code.as_str().is_empty() && !normalized.contains(&code) {
                normalized.push(code);
            }
        }
        Self { codes: normalized }
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.resolve(code).is_some()
    }

    /// Normalizes `code` and returns it if it is on the allow-list.
    pub fn resolve(&self, code: &str) -> Option<CurrencyCode> {
        let code = CurrencyCode::new(code);
        if code.as_str().is_empty() {
            return None;
        }
        self.codes.iter().find(|c| **c == code).cloned()
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Every ordered pair of distinct supported currencies.
    pub fn pairs(&self) -> impl Iterator<Item = (&CurrencyCode, &CurrencyCode)> {
        self.codes.iter().enumerate().flat_map(move |(i, from)| {
            self.codes
                .iter()
                .enumerate()
                .filter(move |(j, _)| i != *j)
                .map(move |(_, to)| (from, to))
        })
    }
}

impl Default for SupportedCurrencies {
    fn default() -> Self {
        SupportedCurrencies::new(["USD", "INR", "EUR", "JPY", "GBP"])
    }
}

/// Fetches conversion rates from an upstream source.
///
/// `date` of `None` asks for the latest rate. Implementations may ignore the
/// date and return the spot rate, so callers must not assume the result is
/// specific to the requested day.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn fetch_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: Option<NaiveDate>,
    ) -> Result<f64>;
}
