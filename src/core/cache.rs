//! Rate caching abstractions

use crate::core::currency::CurrencyCode;
use chrono::{DateTime, Utc};
use std::fmt::Display;

/// Key for a cached rate: an ordered pair of distinct currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl RateKey {
    pub fn new(from: &CurrencyCode, to: &CurrencyCode) -> Self {
        RateKey {
            from: from.clone(),
            to: to.clone(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl Display for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEntry {
    pub rate: f64,
    pub last_updated: DateTime<Utc>,
}

/// Read/write access to the latest known rates.
///
/// Neither operation performs I/O; a miss is reported as `None` and it is up to
/// the caller to fetch and store a fresh rate.
pub trait RateStore: Send + Sync {
    fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64>;
    fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64);
}
