use super::util::with_retry;
use crate::core::config::ProviderConfig;
use crate::core::currency::{CurrencyCode, CurrencyRateProvider};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Rate provider backed by the exchangerate-api.com v6 pair endpoint.
///
/// The free plan has no historical endpoint, so requested dates are ignored
/// and the latest rate is returned for every call.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rate: Option<f64>,
}

impl ExchangeRateApiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!(
                "An exchange rate API key is required, set provider.api_key or {}",
                crate::core::config::API_KEY_ENV
            );
        }

        let client = reqwest::Client::builder()
            .user_agent("xrate/1.0")
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ExchangeRateApiProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            client,
            retries: config.retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn endpoint(&self, from: &CurrencyCode, to: &CurrencyCode) -> String {
        format!("{}/{}/pair/{}/{}", self.base_url, self.api_key, from, to)
    }

    async fn request_rate(&self, url: &str, pair: &str) -> Result<f64> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| anyhow!("Request error for currency pair {}: {}", pair, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(body = %body.trim(), "Error response from rate API");
            bail!("HTTP error: {} for currency pair: {}", status, pair);
        }

        let text = response.text().await?;
        let data: PairResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", pair, e))?;

        if data.result != "success" {
            bail!(
                "API error for {}: {} ({})",
                pair,
                data.result,
                data.error_type.as_deref().unwrap_or("unknown")
            );
        }

        match data.conversion_rate {
            Some(rate) if rate > 0.0 => Ok(rate),
            Some(rate) => bail!("Invalid rate {} for currency pair: {}", rate, pair),
            None => bail!("No rate data found for currency pair: {}", pair),
        }
    }
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(from = %from, to = %to)
    )]
    async fn fetch_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: Option<NaiveDate>,
    ) -> Result<f64> {
        let pair = format!("{from}-{to}");
        if let Some(date) = date {
            debug!("Historical rates need a paid plan, ignoring date {}", date);
        }

        let url = self.endpoint(from, to);
        debug!("Requesting currency rate for {}", pair);

        with_retry(
            || self.request_rate(&url, &pair),
            self.retries,
            self.retry_delay,
        )
        .await
    }
}
