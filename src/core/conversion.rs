//! Rate resolution and amount conversion.
//!
//! Latest rates are served from a [`RateStore`] and written through on a miss.
//! Dated requests always go to the provider and never touch the store.

use crate::core::cache::RateStore;
use crate::core::currency::{CurrencyCode, CurrencyRateProvider, SupportedCurrencies};
use crate::core::error::ConversionError;
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub currencies: SupportedCurrencies,
    pub max_historical_days: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        ConversionSettings {
            currencies: SupportedCurrencies::default(),
            max_historical_days: 90,
        }
    }
}

pub struct ConversionService {
    cache: Arc<dyn RateStore>,
    provider: Arc<dyn CurrencyRateProvider>,
    settings: ConversionSettings,
}

impl ConversionService {
    pub fn new(
        cache: Arc<dyn RateStore>,
        provider: Arc<dyn CurrencyRateProvider>,
        settings: ConversionSettings,
    ) -> Self {
        ConversionService {
            cache,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// Converts `amount` of `from` into `to`.
    ///
    /// An empty `date` uses the latest rate; otherwise the rate for that day is
    /// requested from the provider.
    pub async fn convert_amount(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        date: &str,
    ) -> Result<f64, ConversionError> {
        let (from, to) = self.validate_pair(from, to)?;

        if amount < 0.0 || !amount.is_finite() {
            return Err(ConversionError::InvalidAmount(amount));
        }

        if from == to {
            return Ok(amount);
        }

        let rate = self.resolve_rate(&from, &to, date).await?;
        Ok(amount * rate)
    }

    /// Returns the rate for `from`/`to` on `date` (YYYY-MM-DD). Never cached.
    pub async fn get_historical_rate(
        &self,
        from: &str,
        to: &str,
        date: &str,
    ) -> Result<f64, ConversionError> {
        let (from, to) = self.validate_pair(from, to)?;

        if from == to {
            return Ok(1.0);
        }

        let date = self.validate_date(date)?;
        self.fetch_from_provider(&from, &to, Some(date)).await
    }

    async fn resolve_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: &str,
    ) -> Result<f64, ConversionError> {
        if !date.is_empty() {
            let date = self.validate_date(date)?;
            return self.fetch_from_provider(from, to, Some(date)).await;
        }

        if let Some(rate) = self.cache.get_rate(from, to) {
            return Ok(rate);
        }

        let rate = self.fetch_from_provider(from, to, None).await?;
        self.cache.set_rate(from, to, rate);
        Ok(rate)
    }

    async fn fetch_from_provider(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: Option<NaiveDate>,
    ) -> Result<f64, ConversionError> {
        if let Some(date) = date {
            // The upstream plan only serves spot rates; the date is passed along
            // but the returned rate may not be specific to it.
            debug!("Requesting {}-{} for {} from provider", from, to, date);
        }

        let rate = self
            .provider
            .fetch_rate(from, to, date)
            .await
            .map_err(|e| ConversionError::ProviderUnavailable(format!("{e:#}")))?;

        if rate <= 0.0 || !rate.is_finite() {
            return Err(ConversionError::InvalidProviderRate(rate));
        }
        Ok(rate)
    }

    fn validate_pair(
        &self,
        from: &str,
        to: &str,
    ) -> Result<(CurrencyCode, CurrencyCode), ConversionError> {
        let supported = &self.settings.currencies;
        let from = supported
            .resolve(from)
            .ok_or_else(|| ConversionError::UnsupportedCurrency(from.trim().to_string()))?;
        let to = supported
            .resolve(to)
            .ok_or_else(|| ConversionError::UnsupportedCurrency(to.trim().to_string()))?;
        Ok((from, to))
    }

    fn validate_date(&self, date: &str) -> Result<NaiveDate, ConversionError> {
        let today = Utc::now().date_naive();
        validate_historical_date(date, today, self.settings.max_historical_days)
    }
}

/// Parses `date` as `YYYY-MM-DD` with exactly four, two and two digits.
pub fn parse_date(date: &str) -> Result<NaiveDate, ConversionError> {
    let invalid = || ConversionError::InvalidDateFormat(date.to_string());

    let bytes = date.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_shaped {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())
}

/// Parses `date` and checks it lies within `[today - max_days, today]`.
pub fn validate_historical_date(
    date: &str,
    today: NaiveDate,
    max_days: u32,
) -> Result<NaiveDate, ConversionError> {
    let parsed = parse_date(date)?;

    if parsed > today {
        return Err(ConversionError::FutureDate(parsed));
    }

    let oldest = today
        .checked_sub_days(Days::new(u64::from(max_days)))
        .unwrap_or(NaiveDate::MIN);
    if parsed < oldest {
        return Err(ConversionError::DateOutOfRange {
            date: parsed,
            max_days,
        });
    }

    Ok(parsed)
}
