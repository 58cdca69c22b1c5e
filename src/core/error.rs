use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a conversion or rate lookup can fail.
///
/// Validation variants are raised before any I/O. `ProviderUnavailable` and
/// `InvalidProviderRate` describe upstream faults after retries are exhausted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("invalid amount: {0} (amount cannot be negative)")]
    InvalidAmount(f64),

    #[error("invalid date format, expected YYYY-MM-DD: {0:?}")]
    InvalidDateFormat(String),

    #[error("date cannot be in the future: {0}")]
    FutureDate(NaiveDate),

    #[error("date {date} is too far in the past, maximum {max_days} days allowed")]
    DateOutOfRange { date: NaiveDate, max_days: u32 },

    #[error("exchange rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("exchange rate provider returned an invalid rate: {0}")]
    InvalidProviderRate(f64),
}

impl ConversionError {
    /// True when the caller must correct its input; false for upstream faults
    /// that may succeed on a later retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ConversionError::ProviderUnavailable(_) | ConversionError::InvalidProviderRate(_)
        )
    }
}
