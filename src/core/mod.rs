//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;

// Re-export main types for cleaner imports
pub use cache::{RateEntry, RateKey, RateStore};
pub use conversion::{ConversionService, ConversionSettings};
pub use currency::{CurrencyCode, CurrencyRateProvider, SupportedCurrencies};
pub use error::ConversionError;
